use crate::executor::{Executor, Row};
use crate::notice::Notices;
use serde::Serialize;

const RECENT_ENROLLMENTS_LIMIT: i64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub title: &'static str,
    /// Suggested chart type; `None` renders as a table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<&'static str>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub students_by_status: Panel,
    pub faculty_by_department: Panel,
    pub recent_enrollments: Panel,
}

fn panel(
    executor: &Executor,
    notices: &mut Notices,
    title: &'static str,
    chart: Option<&'static str>,
    sql: &str,
    params: &[serde_json::Value],
    empty: &str,
) -> Panel {
    let rows = executor.read(sql, params, notices);
    if rows.is_empty() {
        notices.warning(empty);
    }
    Panel { title, chart, rows }
}

pub fn load(executor: &Executor, notices: &mut Notices) -> Dashboard {
    let students_by_status = panel(
        executor,
        notices,
        "Students by Status",
        Some("pie"),
        "SELECT status, COUNT(*) AS count FROM Student GROUP BY status ORDER BY status",
        &[],
        "No student data available",
    );

    let faculty_by_department = panel(
        executor,
        notices,
        "Faculty by Department",
        Some("bar"),
        "SELECT d.dept_name, COUNT(*) AS count
         FROM Faculty f
         JOIN Department d ON f.dept_id = d.dept_id
         GROUP BY d.dept_name
         ORDER BY d.dept_name",
        &[],
        "No faculty data available",
    );

    let recent_enrollments = panel(
        executor,
        notices,
        "Recent Enrollments",
        None,
        "SELECT p.first_name, p.last_name, c.title AS course,
                s.semester, s.year, e.enrollment_date
         FROM Enrollment e
         JOIN Student st ON e.student_id = st.student_id
         JOIN Person p ON st.person_id = p.person_id
         JOIN Section s ON e.section_id = s.section_id
         JOIN Course c ON s.course_id = c.course_id
         ORDER BY e.enrollment_date DESC
         LIMIT ?",
        &[serde_json::Value::from(RECENT_ENROLLMENTS_LIMIT)],
        "No recent enrollments to display",
    );

    Dashboard {
        students_by_status,
        faculty_by_department,
        recent_enrollments,
    }
}
