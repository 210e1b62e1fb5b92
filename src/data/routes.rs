use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::store::{json_list, TransportType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteView {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub transport_type: TransportType,
    pub color: String,
    pub estimated_arrival: String,
    /// Principal destinations shown on the route card
    pub destinations: Vec<String>,
    /// Every stop of the route in travel order
    pub full_route: Vec<String>,
}

/// Every route, sorted by name, with its ordered stop sequence.
pub fn public_transport_routes(conn: &Connection) -> rusqlite::Result<Vec<RouteView>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, transport_type, color, estimated_arrival, destinations
         FROM routes ORDER BY name ASC",
    )?;
    let route_iter = stmt.query_map([], |row| {
        Ok(RouteView {
            id: row.get(0)?,
            name: row.get(1)?,
            transport_type: row.get(2)?,
            color: row.get(3)?,
            estimated_arrival: row
                .get::<_, Option<String>>(4)?
                .unwrap_or_else(|| "N/A".to_string()),
            destinations: json_list(row, 5)?,
            full_route: Vec::new(),
        })
    })?;
    let mut routes = route_iter.collect::<Result<Vec<_>, _>>()?;

    let mut stops = conn.prepare(
        "SELECT s.name
         FROM route_stops rs
         JOIN stops s ON s.id = rs.stop_id
         WHERE rs.route_id = ?1
         ORDER BY rs.position ASC",
    )?;
    for route in routes.iter_mut() {
        route.full_route = stops
            .query_map([route.id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
    }
    Ok(routes)
}
