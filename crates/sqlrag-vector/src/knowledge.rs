//! Chinook knowledge-base construction.
//!
//! The knowledge base is plain text: one schema chunk per table, followed by
//! business definitions and worked question/SQL pairs. It is built once from
//! the live database schema and cached on disk.

use std::path::Path;

use tracing::info;

use sqlrag_core::SqlRagError;
use sqlrag_storage::{extract_schema_chunks, Database};

const BUSINESS_LOGIC: &str = r#"
---
[BUSINESS LOGIC]

- Revenue per customer = SUM(Invoice.Total) GROUP BY CustomerId
- Churned customers = Customers who haven't purchased in the last 12 months
- Top-selling genre = COUNT(InvoiceLine.TrackId) JOIN Track → Genre
- Most valuable customer = MAX(SUM(Invoice.Total)) GROUP BY CustomerId
- Employee hierarchy = Employee.ReportsTo forms a tree structure of managers
- Playlist popularity = COUNT(PlaylistTrack.TrackId) GROUP BY PlaylistId
- Monthly revenue = SUM(Invoice.Total) GROUP BY strftime('%Y-%m', InvoiceDate)
- Artist revenue = SUM(UnitPrice * Quantity) JOIN Track → Album → Artist
"#;

const EXAMPLE_QUERIES: &str = r#"
---
[EXAMPLE QUERIES]

Q: Which artist generated the highest sales?
SQL:
SELECT a.Name, SUM(il.UnitPrice * il.Quantity) AS TotalSales
FROM InvoiceLine il
JOIN Track t ON il.TrackId = t.TrackId
JOIN Album al ON t.AlbumId = al.AlbumId
JOIN Artist a ON al.ArtistId = a.ArtistId
GROUP BY a.Name
ORDER BY TotalSales DESC
LIMIT 1;

---

Q: Who are the top 5 customers by total spend?
SQL:
SELECT c.FirstName || ' ' || c.LastName AS CustomerName, SUM(i.Total) AS TotalSpent
FROM Customer c
JOIN Invoice i ON c.CustomerId = i.CustomerId
GROUP BY c.CustomerId
ORDER BY TotalSpent DESC
LIMIT 5;

---

Q: What is the most popular genre by track count?
SQL:
SELECT g.Name, COUNT(t.TrackId) AS TrackCount
FROM Track t
JOIN Genre g ON t.GenreId = g.GenreId
GROUP BY g.GenreId
ORDER BY TrackCount DESC
LIMIT 1;

---

Q: How much revenue was generated each month?
SQL:
SELECT strftime('%Y-%m', InvoiceDate) AS Month, SUM(Total) AS Revenue
FROM Invoice
GROUP BY Month
ORDER BY Month;

---

Q: Which employee manages the most customers?
SQL:
SELECT e.FirstName || ' ' || e.LastName AS RepName, COUNT(c.CustomerId) AS NumCustomers
FROM Customer c
JOIN Employee e ON c.SupportRepId = e.EmployeeId
GROUP BY e.EmployeeId
ORDER BY NumCustomers DESC
LIMIT 1;

---

Q: Which tracks appear in the most playlists?
SQL:
SELECT t.Name, COUNT(*) AS PlaylistCount
FROM PlaylistTrack pt
JOIN Track t ON pt.TrackId = t.TrackId
GROUP BY pt.TrackId
ORDER BY PlaylistCount DESC
LIMIT 5;
"#;

/// Assemble the knowledge-base text from per-table schema chunks.
pub fn build_knowledge_base(schema_chunks: &[String]) -> String {
    let mut text = String::from("\n---\n[SCHEMA]\n\n");
    text.push_str(&schema_chunks.join("\n\n---\n"));
    text.push_str(BUSINESS_LOGIC);
    text.push_str(EXAMPLE_QUERIES);
    text
}

/// Build the knowledge base from the database schema.
pub fn build_from_database(db: &Database) -> Result<String, SqlRagError> {
    let chunks = extract_schema_chunks(db)?;
    info!(tables = chunks.len(), "Knowledge base built from schema");
    Ok(build_knowledge_base(&chunks))
}

/// Write the knowledge base, creating parent directories as needed.
pub fn write_knowledge_base(path: &Path, text: &str) -> Result<(), SqlRagError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    info!(path = %path.display(), bytes = text.len(), "Knowledge base written");
    Ok(())
}

/// Read the cached knowledge base, or build and cache it from `db`.
pub fn load_or_build(path: &Path, db: &Database) -> Result<String, SqlRagError> {
    if path.is_file() {
        let text = std::fs::read_to_string(path)?;
        info!(path = %path.display(), "Knowledge base loaded");
        return Ok(text);
    }

    let text = build_from_database(db)?;
    write_knowledge_base(path, &text)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlrag_storage::fixtures;

    #[test]
    fn test_build_knowledge_base_layout() {
        let chunks = vec![
            "Table: Artist\nColumns:\n  - ArtistId (INTEGER) [PK] [NOT NULL]".to_string(),
            "Table: Genre\nColumns:\n  - GenreId (INTEGER) [PK] [NOT NULL]".to_string(),
        ];
        let text = build_knowledge_base(&chunks);

        assert!(text.starts_with("\n---\n[SCHEMA]\n\nTable: Artist"));
        assert!(text.contains("[NOT NULL]\n\n---\nTable: Genre"));
        let logic = text.find("[BUSINESS LOGIC]").unwrap();
        let examples = text.find("[EXAMPLE QUERIES]").unwrap();
        assert!(logic < examples);
        assert!(text.contains("Who are the top 5 customers by total spend?"));
    }

    #[test]
    fn test_load_or_build_caches_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let db = fixtures::seed_chinook(&dir.path().join("chinook.db")).unwrap();
        let kb_path = dir.path().join("rag").join("kb.txt");

        let built = load_or_build(&kb_path, &db).unwrap();
        assert!(kb_path.is_file());
        assert!(built.contains("Table: InvoiceLine"));

        // Cached copy wins over the database on the next load.
        std::fs::write(&kb_path, "cached").unwrap();
        assert_eq!(load_or_build(&kb_path, &db).unwrap(), "cached");
    }

    #[test]
    fn test_load_or_build_without_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("absent.db"));
        let result = load_or_build(&dir.path().join("kb.txt"), &db);
        assert!(result.is_err());
        assert!(!dir.path().join("kb.txt").exists());
    }
}
