use rusqlite::Connection;

/// Tables backing stations, vehicles, routes and both trip kinds.
///
/// Every statement is `IF NOT EXISTS` so opening an existing database is a no-op.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY,
    first_name  TEXT NOT NULL,
    last_name   TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,
    user_type   TEXT NOT NULL DEFAULT 'traveler'
);

CREATE TABLE IF NOT EXISTS stations (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    capacity    INTEGER NOT NULL,
    latitude    REAL NOT NULL,
    longitude   REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS individual_vehicles (
    id                INTEGER PRIMARY KEY,
    station_id        INTEGER REFERENCES stations(id),
    status            TEXT NOT NULL DEFAULT 'Available',
    price_per_minute  REAL NOT NULL,
    carbon_factor     REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS bikes (
    vehicle_id   INTEGER PRIMARY KEY REFERENCES individual_vehicles(id),
    tire_status  TEXT
);

CREATE TABLE IF NOT EXISTS scooters (
    vehicle_id     INTEGER PRIMARY KEY REFERENCES individual_vehicles(id),
    battery_level  REAL
);

CREATE TABLE IF NOT EXISTS routes (
    id                 INTEGER PRIMARY KEY,
    name               TEXT NOT NULL,
    transport_type     TEXT NOT NULL,
    color              TEXT NOT NULL,
    estimated_arrival  TEXT,
    destinations       TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS stops (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS route_stops (
    route_id  INTEGER NOT NULL REFERENCES routes(id),
    stop_id   INTEGER NOT NULL REFERENCES stops(id),
    position  INTEGER NOT NULL,
    PRIMARY KEY (route_id, stop_id),
    UNIQUE (route_id, position)
);

CREATE TABLE IF NOT EXISTS collective_vehicles (
    id              INTEGER PRIMARY KEY,
    route_id        INTEGER NOT NULL REFERENCES routes(id),
    status          TEXT NOT NULL DEFAULT 'Available',
    price_per_ride  REAL NOT NULL,
    carbon_factor   REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS vehicle_trips (
    id                   INTEGER PRIMARY KEY,
    user_id              INTEGER NOT NULL REFERENCES users(id),
    vehicle_id           INTEGER NOT NULL REFERENCES individual_vehicles(id),
    origin               TEXT NOT NULL,
    planned_destination  TEXT NOT NULL,
    actual_destination   TEXT,
    status               TEXT NOT NULL,
    start_time           TEXT NOT NULL,
    end_time             TEXT,
    cost                 REAL,
    carbon_saved         REAL,
    rating               INTEGER
);

CREATE TABLE IF NOT EXISTS public_transport_trips (
    id                     INTEGER PRIMARY KEY,
    user_id                INTEGER NOT NULL REFERENCES users(id),
    collective_vehicle_id  INTEGER NOT NULL REFERENCES collective_vehicles(id),
    route_id               INTEGER NOT NULL REFERENCES routes(id),
    start_stop_id          INTEGER NOT NULL REFERENCES stops(id),
    end_stop_id            INTEGER NOT NULL REFERENCES stops(id),
    origin                 TEXT NOT NULL,
    planned_destination    TEXT NOT NULL,
    actual_destination     TEXT,
    current_station_index  INTEGER NOT NULL,
    full_route             TEXT NOT NULL,
    status                 TEXT NOT NULL,
    start_time             TEXT NOT NULL,
    end_time               TEXT,
    cost                   REAL,
    carbon_saved           REAL,
    rating                 INTEGER
);

CREATE INDEX IF NOT EXISTS vehicle_trips_user_status ON vehicle_trips (user_id, status);
CREATE INDEX IF NOT EXISTS public_transport_trips_user_status ON public_transport_trips (user_id, status);
";

pub fn create(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)
}

/// Table names in dependency order, used for reporting.
pub const TABLES: [&str; 11] = [
    "users",
    "stations",
    "individual_vehicles",
    "bikes",
    "scooters",
    "routes",
    "stops",
    "route_stops",
    "collective_vehicles",
    "vehicle_trips",
    "public_transport_trips",
];
