use crate::crud::EntitySpec;
use crate::dependent::WritePlan;
use crate::forms::FieldDescriptor;

pub fn books() -> EntitySpec {
    EntitySpec {
        page: "Library",
        entity: "Library Book",
        key_column: "book_id",
        label_columns: &[],
        display_query: "SELECT b.book_id, b.title, b.author, b.isbn, b.status, f.facility_type AS facility
             FROM Library_Book b
             JOIN Facility f ON b.facility_id = f.facility_id
             ORDER BY b.title",
        get_record_query: "SELECT title, author, isbn, status, facility_id
             FROM Library_Book
             WHERE book_id = ?",
        fields: vec![
            FieldDescriptor::text("title", "Title"),
            FieldDescriptor::text("author", "Author"),
            FieldDescriptor::text("isbn", "ISBN"),
            FieldDescriptor::choice("status", "Status", &["Available", "Checked Out", "Lost"]),
            // Every library facility shares the same type, so label by id to keep options distinct.
            FieldDescriptor::lookup(
                "facility_id",
                "Facility",
                "SELECT facility_id, facility_type || ' #' || facility_id AS name
                 FROM Facility
                 WHERE facility_type = 'Library'",
                "name",
                "facility_id",
            )
            .required(),
        ],
        insert: Some(WritePlan::insert(
            "INSERT INTO Library_Book (title, author, isbn, status, facility_id) VALUES (?, ?, ?, ?, ?)",
        )),
        update: Some(WritePlan::update(
            "UPDATE Library_Book
             SET title = ?, author = ?, isbn = ?, status = ?, facility_id = ?
             WHERE book_id = ?",
        )),
        delete: Some(WritePlan::delete("DELETE FROM Library_Book WHERE book_id = ?")),
        delete_guards: Vec::new(),
    }
}
