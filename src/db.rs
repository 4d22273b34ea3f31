use crate::config::DatabaseConfig;
use crate::error::DbError;
use rusqlite::Connection;
use std::time::Duration;

/// Open one short-lived connection. Callers drop it when their operation ends.
pub fn connect(cfg: &DatabaseConfig) -> Result<Connection, DbError> {
    tracing::debug!(
        host = %cfg.host,
        user = %cfg.user,
        database = %cfg.database,
        "opening connection"
    );
    let conn = Connection::open(&cfg.database).map_err(DbError::Connect)?;
    conn.busy_timeout(Duration::from_secs(cfg.timeout))
        .map_err(DbError::Connect)?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .map_err(DbError::Connect)?;
    Ok(conn)
}

/// Create the expected tables when they are missing. Existing tables are left alone.
pub fn ensure_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS Person(
            person_id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            date_of_birth TEXT,
            gender TEXT,
            contact_number TEXT,
            email TEXT,
            person_type TEXT NOT NULL CHECK(person_type IN ('Student', 'Faculty'))
        )",
        [],
    )?;

    // Department and Faculty reference each other; SQLite resolves the
    // foreign keys at write time so creation order does not matter.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS Department(
            dept_id INTEGER PRIMARY KEY AUTOINCREMENT,
            dept_name TEXT NOT NULL,
            building TEXT,
            budget REAL,
            head_faculty_id INTEGER,
            FOREIGN KEY(head_faculty_id) REFERENCES Faculty(faculty_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS Student(
            student_id INTEGER PRIMARY KEY AUTOINCREMENT,
            person_id INTEGER NOT NULL UNIQUE,
            enrollment_date TEXT,
            status TEXT NOT NULL DEFAULT 'Active'
                CHECK(status IN ('Active', 'Inactive', 'Graduated', 'Suspended')),
            dept_id INTEGER,
            FOREIGN KEY(person_id) REFERENCES Person(person_id),
            FOREIGN KEY(dept_id) REFERENCES Department(dept_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS Faculty(
            faculty_id INTEGER PRIMARY KEY AUTOINCREMENT,
            person_id INTEGER NOT NULL UNIQUE,
            hire_date TEXT,
            faculty_rank TEXT,
            specialization TEXT,
            dept_id INTEGER,
            FOREIGN KEY(person_id) REFERENCES Person(person_id),
            FOREIGN KEY(dept_id) REFERENCES Department(dept_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS Course(
            course_id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            credits REAL,
            description TEXT,
            dept_id INTEGER,
            FOREIGN KEY(dept_id) REFERENCES Department(dept_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS Section(
            section_id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id INTEGER NOT NULL,
            semester TEXT CHECK(semester IN ('Fall', 'Spring', 'Summer')),
            year INTEGER,
            room_number TEXT,
            faculty_id INTEGER,
            FOREIGN KEY(course_id) REFERENCES Course(course_id),
            FOREIGN KEY(faculty_id) REFERENCES Faculty(faculty_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS Grade(
            grade_id INTEGER PRIMARY KEY AUTOINCREMENT,
            letter_grade TEXT NOT NULL,
            grade_points REAL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS Enrollment(
            student_id INTEGER NOT NULL,
            section_id INTEGER NOT NULL,
            enrollment_date TEXT,
            grade_id INTEGER,
            PRIMARY KEY(student_id, section_id),
            FOREIGN KEY(student_id) REFERENCES Student(student_id),
            FOREIGN KEY(section_id) REFERENCES Section(section_id),
            FOREIGN KEY(grade_id) REFERENCES Grade(grade_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS Facility(
            facility_id INTEGER PRIMARY KEY AUTOINCREMENT,
            facility_type TEXT NOT NULL,
            location TEXT,
            capacity INTEGER
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS Library_Book(
            book_id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            author TEXT,
            isbn TEXT,
            status TEXT NOT NULL DEFAULT 'Available'
                CHECK(status IN ('Available', 'Checked Out', 'Lost')),
            facility_id INTEGER,
            FOREIGN KEY(facility_id) REFERENCES Facility(facility_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS Club(
            club_id INTEGER PRIMARY KEY AUTOINCREMENT,
            club_name TEXT NOT NULL,
            faculty_advisor_id INTEGER,
            FOREIGN KEY(faculty_advisor_id) REFERENCES Faculty(faculty_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_person ON Student(person_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_faculty_person ON Faculty(person_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_enrollment_section ON Enrollment(section_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_club_advisor ON Club(faculty_advisor_id)",
        [],
    )?;

    Ok(())
}
