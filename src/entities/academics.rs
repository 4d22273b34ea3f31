use crate::crud::EntitySpec;
use crate::dependent::WritePlan;
use crate::forms::{FieldDescriptor, NumberSpec};

const DEPARTMENT_OPTIONS: &str = "SELECT dept_id, dept_name FROM Department";

const FACULTY_OPTIONS: &str = "SELECT f.faculty_id, p.first_name || ' ' || p.last_name AS name
     FROM Faculty f
     JOIN Person p ON f.person_id = p.person_id";

pub fn courses() -> EntitySpec {
    EntitySpec {
        page: "Courses",
        entity: "Course",
        key_column: "course_id",
        label_columns: &[],
        display_query: "SELECT c.course_id, c.title, c.credits, c.description, d.dept_name AS department
             FROM Course c
             JOIN Department d ON c.dept_id = d.dept_id
             ORDER BY c.course_id",
        get_record_query: "SELECT title, credits, description, dept_id
             FROM Course
             WHERE course_id = ?",
        fields: vec![
            FieldDescriptor::text("title", "Title"),
            FieldDescriptor::number(
                "credits",
                "Credits",
                NumberSpec {
                    min: 0.0,
                    max: 10.0,
                    default: None,
                    step: 0.5,
                },
            ),
            FieldDescriptor::text("description", "Description"),
            FieldDescriptor::lookup("dept_id", "Department", DEPARTMENT_OPTIONS, "dept_name", "dept_id").required(),
        ],
        insert: Some(WritePlan::insert(
            "INSERT INTO Course (title, credits, description, dept_id) VALUES (?, ?, ?, ?)",
        )),
        update: Some(WritePlan::update(
            "UPDATE Course
             SET title = ?, credits = ?, description = ?, dept_id = ?
             WHERE course_id = ?",
        )),
        delete: Some(WritePlan::delete("DELETE FROM Course WHERE course_id = ?")),
        delete_guards: Vec::new(),
    }
}

pub fn departments() -> EntitySpec {
    EntitySpec {
        page: "Departments",
        entity: "Department",
        key_column: "dept_id",
        label_columns: &["dept_name"],
        display_query: "SELECT d.dept_id, d.dept_name, d.building, d.budget,
                    p.first_name || ' ' || p.last_name AS head_name
             FROM Department d
             LEFT JOIN Faculty f ON d.head_faculty_id = f.faculty_id
             LEFT JOIN Person p ON f.person_id = p.person_id
             ORDER BY d.dept_name",
        get_record_query: "SELECT dept_name, building, budget, head_faculty_id
             FROM Department
             WHERE dept_id = ?",
        fields: vec![
            FieldDescriptor::text("dept_name", "Department Name"),
            FieldDescriptor::text("building", "Building"),
            FieldDescriptor::number(
                "budget",
                "Budget",
                NumberSpec {
                    step: 1000.0,
                    ..NumberSpec::default()
                },
            ),
            FieldDescriptor::lookup("head_faculty_id", "Department Head", FACULTY_OPTIONS, "name", "faculty_id"),
        ],
        insert: Some(WritePlan::insert(
            "INSERT INTO Department (dept_name, building, budget, head_faculty_id) VALUES (?, ?, ?, ?)",
        )),
        update: Some(WritePlan::update(
            "UPDATE Department
             SET dept_name = ?, building = ?, budget = ?, head_faculty_id = ?
             WHERE dept_id = ?",
        )),
        delete: Some(WritePlan::delete("DELETE FROM Department WHERE dept_id = ?")),
        delete_guards: Vec::new(),
    }
}

pub fn enrollments() -> EntitySpec {
    EntitySpec {
        page: "Enrollments",
        entity: "Enrollment",
        key_column: "student_id,section_id",
        label_columns: &["student_name"],
        display_query: "SELECT e.student_id, e.section_id,
                    p.first_name || ' ' || p.last_name AS student_name,
                    c.title AS course_title, s.semester, s.year,
                    e.enrollment_date, g.letter_grade AS grade
             FROM Enrollment e
             JOIN Student st ON e.student_id = st.student_id
             JOIN Person p ON st.person_id = p.person_id
             JOIN Section s ON e.section_id = s.section_id
             JOIN Course c ON s.course_id = c.course_id
             LEFT JOIN Grade g ON e.grade_id = g.grade_id
             ORDER BY e.enrollment_date DESC",
        get_record_query: "SELECT student_id, section_id, enrollment_date
             FROM Enrollment
             WHERE student_id = ? AND section_id = ?",
        fields: vec![
            FieldDescriptor::lookup(
                "student_id",
                "Student",
                "SELECT s.student_id, p.first_name || ' ' || p.last_name AS name
                 FROM Student s
                 JOIN Person p ON s.person_id = p.person_id",
                "name",
                "student_id",
            )
            .required(),
            FieldDescriptor::lookup(
                "section_id",
                "Section",
                "SELECT s.section_id, c.title || ' (' || s.semester || ' ' || s.year || ')' AS name
                 FROM Section s
                 JOIN Course c ON s.course_id = c.course_id",
                "name",
                "section_id",
            )
            .required(),
            FieldDescriptor::date("enrollment_date", "Enrollment Date"),
        ],
        insert: Some(WritePlan::insert(
            "INSERT INTO Enrollment (student_id, section_id, enrollment_date) VALUES (?, ?, ?)",
        )),
        update: Some(WritePlan::update(
            "UPDATE Enrollment
             SET student_id = ?, section_id = ?, enrollment_date = ?
             WHERE student_id = ? AND section_id = ?",
        )),
        delete: Some(WritePlan::delete(
            "DELETE FROM Enrollment WHERE student_id = ? AND section_id = ?",
        )),
        delete_guards: Vec::new(),
    }
}

pub fn sections() -> EntitySpec {
    EntitySpec {
        page: "Sections",
        entity: "Section",
        key_column: "section_id",
        label_columns: &["course_title", "semester", "year"],
        display_query: "SELECT s.section_id, c.title AS course_title, s.semester, s.year,
                    s.room_number, p.first_name || ' ' || p.last_name AS faculty_name
             FROM Section s
             JOIN Course c ON s.course_id = c.course_id
             JOIN Faculty f ON s.faculty_id = f.faculty_id
             JOIN Person p ON f.person_id = p.person_id
             ORDER BY s.year DESC, s.semester",
        get_record_query: "SELECT course_id, semester, year, room_number, faculty_id
             FROM Section
             WHERE section_id = ?",
        fields: vec![
            FieldDescriptor::lookup("course_id", "Course", "SELECT course_id, title FROM Course", "title", "course_id")
                .required(),
            FieldDescriptor::choice("semester", "Semester", &["Fall", "Spring", "Summer"]),
            FieldDescriptor::number(
                "year",
                "Year",
                NumberSpec {
                    min: 2000.0,
                    max: 2100.0,
                    default: None,
                    step: 1.0,
                },
            ),
            FieldDescriptor::text("room_number", "Room Number"),
            FieldDescriptor::lookup("faculty_id", "Faculty", FACULTY_OPTIONS, "name", "faculty_id").required(),
        ],
        insert: Some(WritePlan::insert(
            "INSERT INTO Section (course_id, semester, year, room_number, faculty_id) VALUES (?, ?, ?, ?, ?)",
        )),
        update: Some(WritePlan::update(
            "UPDATE Section
             SET course_id = ?, semester = ?, year = ?, room_number = ?, faculty_id = ?
             WHERE section_id = ?",
        )),
        delete: Some(WritePlan::delete("DELETE FROM Section WHERE section_id = ?")),
        delete_guards: Vec::new(),
    }
}
