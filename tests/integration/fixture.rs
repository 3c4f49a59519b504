//! In-memory SQLite farm store used by the integration tests.

use farm_records::db::SqliteClient;
use farm_records::session::hash_password;

/// Owner whose records the tests read.
pub const OWNER: i64 = 42;

/// A second owner whose records must never show up for [`OWNER`].
pub const NEIGHBOR: i64 = 7;

pub const OWNER_EMAIL: &str = "dana@farm.test";
pub const OWNER_PASSWORD: &str = "hay-bale";

const SCHEMA: &str = "
CREATE TABLE users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    first_name TEXT
);

CREATE TABLE livestock (
    livestock_id INTEGER PRIMARY KEY,
    owner_id INTEGER NOT NULL,
    tag TEXT NOT NULL,
    breed TEXT,
    birth_date DATE
);

CREATE TABLE vaccinations (
    vacc_id INTEGER PRIMARY KEY,
    vac_type TEXT NOT NULL,
    date_given DATE,
    animal_id INTEGER NOT NULL REFERENCES livestock(livestock_id)
);

CREATE TABLE vetvisit (
    visit_id INTEGER PRIMARY KEY,
    livestock_id INTEGER NOT NULL REFERENCES livestock(livestock_id),
    visit_date DATE,
    vet_name TEXT,
    cost REAL,
    reason TEXT,
    notes TEXT
);

CREATE TABLE pastures (
    pasture_id INTEGER PRIMARY KEY,
    owner_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    acreage REAL
);

CREATE TABLE pasture_maintenance (
    maintenance_id INTEGER PRIMARY KEY,
    location INTEGER NOT NULL REFERENCES pastures(pasture_id),
    maintenance_type TEXT NOT NULL,
    cost REAL,
    notes TEXT
);

CREATE TABLE medication (
    med_id INTEGER PRIMARY KEY,
    livestock_id INTEGER NOT NULL REFERENCES livestock(livestock_id),
    medication_name TEXT NOT NULL,
    start_date DATE,
    end_date DATE,
    med_interval TEXT
);

CREATE TABLE calves (
    calf_id INTEGER PRIMARY KEY REFERENCES livestock(livestock_id),
    cow_id INTEGER,
    sired_id INTEGER,
    calf_subtype TEXT,
    vaccine_complete INTEGER NOT NULL DEFAULT 0,
    water_complete INTEGER NOT NULL DEFAULT 0,
    feeder_complete INTEGER NOT NULL DEFAULT 0
);
";

/// Opens a store with the farm schema and no rows.
pub async fn empty_store() -> SqliteClient {
    let client = SqliteClient::open_in_memory().await.unwrap();
    client.execute_script(SCHEMA).await.unwrap();
    client
}

/// Opens a store with records for [`OWNER`] and [`NEIGHBOR`].
///
/// [`OWNER`] has 12 head of livestock (ids 1-12), 3 pastures with 6 maintenance
/// jobs between them, and a few rows in every other table. [`NEIGHBOR`] has one
/// of everything; their animal's birth date is stored as Unix milliseconds.
pub async fn seeded_store() -> SqliteClient {
    let client = empty_store().await;

    let mut script = format!(
        "INSERT INTO users (user_id, email, password_hash)
         VALUES ({OWNER}, '{OWNER_EMAIL}', '{}'), ({NEIGHBOR}, 'lee@farm.test', '{}');",
        hash_password(OWNER_PASSWORD),
        hash_password("corn-crib"),
    );

    for id in 1..=12 {
        script.push_str(&format!(
            "INSERT INTO livestock VALUES ({id}, {OWNER}, 'A-{id:03}', 'Angus', '2021-03-{id:02}');"
        ));
    }
    // Stored as Unix milliseconds (2023-05-01T00:00:00Z), not text.
    script.push_str(&format!(
        "INSERT INTO livestock VALUES (100, {NEIGHBOR}, 'N-001', 'Hereford', 1682899200000);"
    ));

    script.push_str(&format!(
        "INSERT INTO pastures VALUES (1, {OWNER}, 'North Field', 12.5);
         INSERT INTO pastures VALUES (2, {OWNER}, 'Creek Bottom', 30.0);
         INSERT INTO pastures VALUES (3, {OWNER}, 'Hill', 8.0);
         INSERT INTO pastures VALUES (50, {NEIGHBOR}, 'Back Forty', 40.0);"
    ));
    for (id, location) in [(1, 1), (2, 1), (3, 2), (4, 2), (5, 3), (6, 3), (7, 50)] {
        script.push_str(&format!(
            "INSERT INTO pasture_maintenance
             VALUES ({id}, {location}, 'Fence repair', 120.0, NULL);"
        ));
    }

    script.push_str(
        "INSERT INTO vaccinations VALUES (1, 'Blackleg', '2023-04-10', 1);
         INSERT INTO vaccinations VALUES (2, 'BVD', '2023-04-11 09:15:00', 2);
         INSERT INTO vaccinations VALUES (3, 'Blackleg', '2023-04-10', 100);

         INSERT INTO vetvisit
         VALUES (1, 3, '2023-06-01', 'Dr. Ruiz', 85.5, 'Limp', 'Front left hoof');
         INSERT INTO vetvisit VALUES (2, 100, '2023-06-02', 'Dr. Ruiz', 40.0, 'Checkup', NULL);

         INSERT INTO medication VALUES (1, 4, 'Penicillin', '2023-05-01', '2023-05-07', 'daily');
         INSERT INTO medication VALUES (2, 5, 'Ivermectin', '2024-01-15 08:30:00', NULL, 'once');
         INSERT INTO medication VALUES (3, 100, 'Draxxin', '2023-02-01', NULL, 'once');

         INSERT INTO calves VALUES (11, 1, NULL, 'heifer', 1, 1, 0);
         INSERT INTO calves VALUES (12, 2, NULL, 'steer', 0, 1, 1);
         INSERT INTO calves VALUES (100, NULL, NULL, 'bull', 1, 1, 1);",
    );

    client.execute_script(&script).await.unwrap();
    client
}
