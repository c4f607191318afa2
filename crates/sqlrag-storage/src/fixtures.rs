//! Chinook-shaped seed database for tests and benches.
//!
//! Same tables and columns as the Chinook sample schema, with a handful of
//! rows per table. Customer spend is distinct per customer so "top N by
//! spend" queries have a stable order.

use std::path::Path;

use rusqlite::Connection;

use crate::db::Database;
use crate::error::SqlExecutionError;

/// Number of customers in the seed data.
pub const CUSTOMER_COUNT: usize = 7;

/// Number of tables created by [`CHINOOK_SCHEMA`].
pub const TABLE_COUNT: usize = 11;

/// Chinook DDL (subset of constraints kept: keys and foreign keys).
pub const CHINOOK_SCHEMA: &str = r#"
CREATE TABLE Artist (
    ArtistId INTEGER NOT NULL PRIMARY KEY,
    Name NVARCHAR(120)
);
CREATE TABLE Album (
    AlbumId INTEGER NOT NULL PRIMARY KEY,
    Title NVARCHAR(160) NOT NULL,
    ArtistId INTEGER NOT NULL,
    FOREIGN KEY (ArtistId) REFERENCES Artist (ArtistId)
);
CREATE TABLE Genre (
    GenreId INTEGER NOT NULL PRIMARY KEY,
    Name NVARCHAR(120)
);
CREATE TABLE MediaType (
    MediaTypeId INTEGER NOT NULL PRIMARY KEY,
    Name NVARCHAR(120)
);
CREATE TABLE Track (
    TrackId INTEGER NOT NULL PRIMARY KEY,
    Name NVARCHAR(200) NOT NULL,
    AlbumId INTEGER,
    MediaTypeId INTEGER NOT NULL,
    GenreId INTEGER,
    Composer NVARCHAR(220),
    Milliseconds INTEGER NOT NULL,
    Bytes INTEGER,
    UnitPrice NUMERIC(10,2) NOT NULL,
    FOREIGN KEY (AlbumId) REFERENCES Album (AlbumId),
    FOREIGN KEY (GenreId) REFERENCES Genre (GenreId),
    FOREIGN KEY (MediaTypeId) REFERENCES MediaType (MediaTypeId)
);
CREATE TABLE Playlist (
    PlaylistId INTEGER NOT NULL PRIMARY KEY,
    Name NVARCHAR(120)
);
CREATE TABLE PlaylistTrack (
    PlaylistId INTEGER NOT NULL,
    TrackId INTEGER NOT NULL,
    PRIMARY KEY (PlaylistId, TrackId),
    FOREIGN KEY (PlaylistId) REFERENCES Playlist (PlaylistId),
    FOREIGN KEY (TrackId) REFERENCES Track (TrackId)
);
CREATE TABLE Employee (
    EmployeeId INTEGER NOT NULL PRIMARY KEY,
    LastName NVARCHAR(20) NOT NULL,
    FirstName NVARCHAR(20) NOT NULL,
    Title NVARCHAR(30),
    ReportsTo INTEGER,
    HireDate DATETIME,
    Country NVARCHAR(40),
    Email NVARCHAR(60),
    FOREIGN KEY (ReportsTo) REFERENCES Employee (EmployeeId)
);
CREATE TABLE Customer (
    CustomerId INTEGER NOT NULL PRIMARY KEY,
    FirstName NVARCHAR(40) NOT NULL,
    LastName NVARCHAR(20) NOT NULL,
    Company NVARCHAR(80),
    City NVARCHAR(40),
    Country NVARCHAR(40),
    Email NVARCHAR(60) NOT NULL,
    SupportRepId INTEGER,
    FOREIGN KEY (SupportRepId) REFERENCES Employee (EmployeeId)
);
CREATE TABLE Invoice (
    InvoiceId INTEGER NOT NULL PRIMARY KEY,
    CustomerId INTEGER NOT NULL,
    InvoiceDate DATETIME NOT NULL,
    BillingCountry NVARCHAR(40),
    Total NUMERIC(10,2) NOT NULL,
    FOREIGN KEY (CustomerId) REFERENCES Customer (CustomerId)
);
CREATE TABLE InvoiceLine (
    InvoiceLineId INTEGER NOT NULL PRIMARY KEY,
    InvoiceId INTEGER NOT NULL,
    TrackId INTEGER NOT NULL,
    UnitPrice NUMERIC(10,2) NOT NULL,
    Quantity INTEGER NOT NULL,
    FOREIGN KEY (InvoiceId) REFERENCES Invoice (InvoiceId),
    FOREIGN KEY (TrackId) REFERENCES Track (TrackId)
);
"#;

const CHINOOK_SEED: &str = r#"
INSERT INTO Artist VALUES (1, 'AC/DC'), (2, 'Accept'), (3, 'Aerosmith');
INSERT INTO Album VALUES
    (1, 'For Those About To Rock We Salute You', 1),
    (2, 'Balls to the Wall', 2),
    (3, 'Big Ones', 3);
INSERT INTO Genre VALUES (1, 'Rock'), (2, 'Metal');
INSERT INTO MediaType VALUES (1, 'MPEG audio file');
INSERT INTO Track VALUES
    (1, 'For Those About To Rock (We Salute You)', 1, 1, 1, 'Angus Young', 343719, 11170334, 0.99),
    (2, 'Balls to the Wall', 2, 1, 2, NULL, 342562, 5510424, 0.99),
    (3, 'Walk On Water', 3, 1, 1, 'Steven Tyler', 295680, 9719579, 0.99),
    (4, 'Love In An Elevator', 3, 1, 1, 'Steven Tyler', 321828, 10552051, 0.99);
INSERT INTO Playlist VALUES (1, 'Music'), (2, 'Heavy Metal Classic');
INSERT INTO PlaylistTrack VALUES (1, 1), (1, 2), (1, 3), (2, 2);
INSERT INTO Employee VALUES
    (1, 'Adams', 'Andrew', 'General Manager', NULL, '2002-08-14', 'Canada', 'andrew@chinookcorp.com'),
    (2, 'Peacock', 'Jane', 'Sales Support Agent', 1, '2002-04-01', 'Canada', 'jane@chinookcorp.com'),
    (3, 'Park', 'Margaret', 'Sales Support Agent', 1, '2003-05-03', 'Canada', 'margaret@chinookcorp.com');
INSERT INTO Customer VALUES
    (1, 'Luís', 'Gonçalves', 'Embraer', 'São José dos Campos', 'Brazil', 'luisg@embraer.com.br', 3),
    (2, 'Leonie', 'Köhler', NULL, 'Stuttgart', 'Germany', 'leonekohler@surfeu.de', 2),
    (3, 'François', 'Tremblay', NULL, 'Montréal', 'Canada', 'ftremblay@gmail.com', 3),
    (4, 'Bjørn', 'Hansen', NULL, 'Oslo', 'Norway', 'bjorn.hansen@yahoo.no', 2),
    (5, 'František', 'Wichterlová', 'JetBrains s.r.o.', 'Prague', 'Czech Republic', 'frantisekw@jetbrains.com', 2),
    (6, 'Helena', 'Holý', NULL, 'Prague', 'Czech Republic', 'hholy@gmail.com', 2),
    (7, 'Astrid', 'Gruber', NULL, 'Vienne', 'Austria', 'astrid.gruber@apple.at', 2);
INSERT INTO Invoice VALUES
    (1, 2, '2009-01-01 00:00:00', 'Germany', 1.98),
    (2, 4, '2009-01-02 00:00:00', 'Norway', 3.96),
    (3, 6, '2009-01-03 00:00:00', 'Czech Republic', 5.94),
    (4, 6, '2009-02-11 00:00:00', 'Czech Republic', 8.91),
    (5, 5, '2009-02-19 00:00:00', 'Czech Republic', 13.86),
    (6, 1, '2009-03-04 00:00:00', 'Brazil', 0.99),
    (7, 3, '2009-03-05 00:00:00', 'Canada', 2.97),
    (8, 7, '2009-03-06 00:00:00', 'Austria', 7.92),
    (9, 4, '2009-04-06 00:00:00', 'Norway', 2.97);
INSERT INTO InvoiceLine VALUES
    (1, 1, 2, 0.99, 1),
    (2, 1, 3, 0.99, 1),
    (3, 2, 1, 0.99, 4),
    (4, 3, 4, 0.99, 6),
    (5, 4, 3, 0.99, 9),
    (6, 5, 1, 0.99, 14),
    (7, 6, 2, 0.99, 1),
    (8, 7, 4, 0.99, 3),
    (9, 8, 3, 0.99, 8),
    (10, 9, 2, 0.99, 3);
"#;

/// Create (or overwrite) a seeded Chinook database at `path`.
pub fn seed_chinook(path: &Path) -> Result<Database, SqlExecutionError> {
    if path.exists() {
        std::fs::remove_file(path).map_err(|e| SqlExecutionError::Unexpected(e.to_string()))?;
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| SqlExecutionError::Unexpected(e.to_string()))?;
    }

    let conn = Connection::open(path)?;
    seed_connection(&conn)?;
    conn.close().map_err(|(_, e)| SqlExecutionError::from(e))?;

    Ok(Database::new(path))
}

/// Create the Chinook tables and rows on an existing connection.
pub fn seed_connection(conn: &Connection) -> Result<(), SqlExecutionError> {
    conn.execute_batch(CHINOOK_SCHEMA)?;
    conn.execute_batch(CHINOOK_SEED)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_counts() {
        let conn = Connection::open_in_memory().unwrap();
        seed_connection(&conn).unwrap();

        let customers: i64 = conn
            .query_row("SELECT COUNT(*) FROM Customer", [], |r| r.get(0))
            .unwrap();
        assert_eq!(customers, CUSTOMER_COUNT as i64);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(tables, TABLE_COUNT as i64);
    }

    #[test]
    fn test_customer_spend_is_distinct() {
        let conn = Connection::open_in_memory().unwrap();
        seed_connection(&conn).unwrap();

        let mut stmt = conn
            .prepare("SELECT SUM(Total) FROM Invoice GROUP BY CustomerId")
            .unwrap();
        let totals: Vec<f64> = stmt
            .query_map([], |r| r.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(totals.len(), CUSTOMER_COUNT);

        let mut cents: Vec<i64> = totals.iter().map(|t| (t * 100.0).round() as i64).collect();
        cents.sort_unstable();
        cents.dedup();
        assert_eq!(cents.len(), CUSTOMER_COUNT);
    }

    #[test]
    fn test_seed_chinook_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chinook.db");
        seed_chinook(&path).unwrap();
        // Second seed must not fail on "table already exists".
        let db = seed_chinook(&path).unwrap();
        assert!(db.exists());
    }
}
