//! Students and Faculty: each row hangs off a shared Person row, so every
//! write touches two tables inside one plan.

use crate::crud::EntitySpec;
use crate::dependent::{Bind, Guard, Step, WritePlan};
use crate::forms::FieldDescriptor;

const GENDERS: &[&str] = &["Male", "Female", "Other"];
const STUDENT_STATUSES: &[&str] = &["Active", "Inactive", "Graduated", "Suspended"];

fn person_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::text("first_name", "First Name").required(),
        FieldDescriptor::text("last_name", "Last Name").required(),
        FieldDescriptor::date("date_of_birth", "Date of Birth"),
        FieldDescriptor::choice("gender", "Gender", GENDERS),
        FieldDescriptor::text("contact_number", "Contact Number"),
        FieldDescriptor::text("email", "Email").required(),
    ]
}

fn person_binds() -> Vec<Bind> {
    [
        "first_name",
        "last_name",
        "date_of_birth",
        "gender",
        "contact_number",
        "email",
    ]
    .into_iter()
    .map(Bind::Field)
    .collect()
}

fn person_binds_then_key() -> Vec<Bind> {
    let mut binds = person_binds();
    binds.push(Bind::Keys);
    binds
}

fn department_field() -> FieldDescriptor {
    FieldDescriptor::lookup(
        "dept_id",
        "Department",
        "SELECT dept_id, dept_name FROM Department",
        "dept_name",
        "dept_id",
    )
}

pub fn students() -> EntitySpec {
    let mut fields = person_fields();
    fields.extend([
        FieldDescriptor::date("enrollment_date", "Enrollment Date").required(),
        FieldDescriptor::choice("status", "Status", STUDENT_STATUSES),
        department_field(),
    ]);

    EntitySpec {
        page: "Students",
        entity: "Student",
        key_column: "student_id",
        label_columns: &["first_name", "last_name"],
        display_query: "SELECT s.student_id, p.first_name, p.last_name, p.email,
                    p.gender, s.enrollment_date, s.status,
                    d.dept_name AS department
             FROM Student s
             JOIN Person p ON s.person_id = p.person_id
             LEFT JOIN Department d ON s.dept_id = d.dept_id
             ORDER BY s.student_id",
        get_record_query: "SELECT s.student_id, p.first_name, p.last_name, p.email, p.gender,
                    p.date_of_birth, p.contact_number,
                    s.enrollment_date, s.status, s.dept_id
             FROM Student s
             JOIN Person p ON s.person_id = p.person_id
             WHERE s.student_id = ?",
        fields,
        insert: Some(WritePlan::new(vec![
            Step::execute_capturing(
                "INSERT INTO Person
                 (first_name, last_name, date_of_birth, gender, contact_number, email, person_type)
                 VALUES (?, ?, ?, ?, ?, ?, 'Student')",
                person_binds(),
                "person_id",
            ),
            Step::execute(
                "INSERT INTO Student (person_id, enrollment_date, status, dept_id)
                 VALUES (?, ?, ?, ?)",
                vec![
                    Bind::Captured("person_id"),
                    Bind::Field("enrollment_date"),
                    Bind::Field("status"),
                    Bind::Field("dept_id"),
                ],
            ),
        ])),
        update: Some(WritePlan::new(vec![
            Step::execute(
                "UPDATE Person SET
                 first_name = ?, last_name = ?, date_of_birth = ?,
                 gender = ?, contact_number = ?, email = ?
                 WHERE person_id = (SELECT person_id FROM Student WHERE student_id = ?)",
                person_binds_then_key(),
            ),
            Step::execute(
                "UPDATE Student SET
                 enrollment_date = ?, status = ?, dept_id = ?
                 WHERE student_id = ?",
                vec![
                    Bind::Field("enrollment_date"),
                    Bind::Field("status"),
                    Bind::Field("dept_id"),
                    Bind::Keys,
                ],
            ),
        ])),
        delete: Some(WritePlan::new(vec![
            Step::lookup(
                "SELECT person_id FROM Student WHERE student_id = ?",
                vec![Bind::Keys],
                "person_id",
                "Student",
            ),
            Step::execute("DELETE FROM Student WHERE student_id = ?", vec![Bind::Keys]),
            Step::execute(
                "DELETE FROM Person WHERE person_id = ?",
                vec![Bind::Captured("person_id")],
            ),
        ])),
        delete_guards: Vec::new(),
    }
}

pub fn faculty() -> EntitySpec {
    let mut fields = person_fields();
    fields.extend([
        FieldDescriptor::date("hire_date", "Hire Date").required(),
        FieldDescriptor::text("faculty_rank", "Rank").required(),
        FieldDescriptor::text("specialization", "Specialization"),
        department_field(),
    ]);

    EntitySpec {
        page: "Faculty",
        entity: "Faculty",
        key_column: "faculty_id",
        label_columns: &["first_name", "last_name"],
        display_query: "SELECT f.faculty_id, p.first_name, p.last_name, p.email,
                    f.faculty_rank, f.specialization, d.dept_name AS department
             FROM Faculty f
             JOIN Person p ON f.person_id = p.person_id
             LEFT JOIN Department d ON f.dept_id = d.dept_id
             ORDER BY p.last_name, p.first_name",
        get_record_query: "SELECT f.faculty_id, p.first_name, p.last_name, p.email, p.gender,
                    p.date_of_birth, p.contact_number,
                    f.hire_date, f.faculty_rank, f.specialization, f.dept_id
             FROM Faculty f
             JOIN Person p ON f.person_id = p.person_id
             WHERE f.faculty_id = ?",
        fields,
        insert: Some(WritePlan::new(vec![
            Step::execute_capturing(
                "INSERT INTO Person
                 (first_name, last_name, date_of_birth, gender, contact_number, email, person_type)
                 VALUES (?, ?, ?, ?, ?, ?, 'Faculty')",
                person_binds(),
                "person_id",
            ),
            Step::execute(
                "INSERT INTO Faculty (person_id, hire_date, faculty_rank, specialization, dept_id)
                 VALUES (?, ?, ?, ?, ?)",
                vec![
                    Bind::Captured("person_id"),
                    Bind::Field("hire_date"),
                    Bind::Field("faculty_rank"),
                    Bind::Field("specialization"),
                    Bind::Field("dept_id"),
                ],
            ),
        ])),
        update: Some(WritePlan::new(vec![
            Step::execute(
                "UPDATE Person SET
                 first_name = ?, last_name = ?, date_of_birth = ?,
                 gender = ?, contact_number = ?, email = ?
                 WHERE person_id = (SELECT person_id FROM Faculty WHERE faculty_id = ?)",
                person_binds_then_key(),
            ),
            Step::execute(
                "UPDATE Faculty SET
                 hire_date = ?, faculty_rank = ?, specialization = ?, dept_id = ?
                 WHERE faculty_id = ?",
                vec![
                    Bind::Field("hire_date"),
                    Bind::Field("faculty_rank"),
                    Bind::Field("specialization"),
                    Bind::Field("dept_id"),
                    Bind::Keys,
                ],
            ),
        ])),
        delete: Some(WritePlan::new(vec![
            Step::lookup(
                "SELECT person_id FROM Faculty WHERE faculty_id = ?",
                vec![Bind::Keys],
                "person_id",
                "Faculty",
            ),
            Step::execute("DELETE FROM Faculty WHERE faculty_id = ?", vec![Bind::Keys]),
            Step::execute(
                "DELETE FROM Person WHERE person_id = ?",
                vec![Bind::Captured("person_id")],
            ),
        ])),
        delete_guards: vec![Guard {
            sql: "SELECT COUNT(*) FROM Club WHERE faculty_advisor_id = ?",
            binds: vec![Bind::Keys],
            message: "Cannot delete faculty member who is advising clubs. Please reassign clubs first.",
        }],
    }
}
