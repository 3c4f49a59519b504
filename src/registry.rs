//! Route registry for paged listings.
//!
//! Each route owns a pair of parameterized SQL templates. The entity query binds
//! `(owner_id, offset, limit)` in that order through `LIMIT ?, ?`, which MySQL and
//! SQLite both accept; the count query binds `(owner_id)`.

use crate::error::{FarmError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A pageable table view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Route {
    Livestock,
    Vaccinations,
    VetVisits,
    PastureMaintenance,
    Medication,
    Calves,
    Pastures,
}

impl Route {
    /// Every route, in registry order.
    pub const ALL: [Route; 7] = [
        Route::Livestock,
        Route::Vaccinations,
        Route::VetVisits,
        Route::PastureMaintenance,
        Route::Medication,
        Route::Calves,
        Route::Pastures,
    ];

    /// The route's wire name.
    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// The route's query templates.
    pub fn descriptor(&self) -> &'static RouteDescriptor {
        &DESCRIPTORS[*self as usize]
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Route {
    type Err = FarmError;

    fn from_str(s: &str) -> Result<Self> {
        lookup(s).map(|descriptor| descriptor.route)
    }
}

/// Static SQL for one route.
#[derive(Debug)]
pub struct RouteDescriptor {
    pub route: Route,
    pub name: &'static str,
    pub entity_query: &'static str,
    pub count_query: &'static str,
}

impl RouteDescriptor {
    /// Parameters the entity query expects: owner, offset, limit.
    pub const ENTITY_PARAMS: usize = 3;

    /// Parameters the count query expects: owner.
    pub const COUNT_PARAMS: usize = 1;
}

static DESCRIPTORS: [RouteDescriptor; 7] = [
    RouteDescriptor {
        route: Route::Livestock,
        name: "livestock",
        entity_query: "SELECT * FROM livestock WHERE owner_id = ? ORDER BY livestock_id LIMIT ?, ?",
        count_query: "SELECT count(*) FROM livestock WHERE owner_id = ?",
    },
    RouteDescriptor {
        route: Route::Vaccinations,
        name: "vaccinations",
        entity_query: concat!(
            "SELECT vaccinations.vacc_id, vaccinations.vac_type, vaccinations.date_given",
            " FROM vaccinations JOIN livestock ON livestock.livestock_id = vaccinations.animal_id",
            " WHERE livestock.owner_id = ? ORDER BY vaccinations.vacc_id LIMIT ?, ?"
        ),
        count_query: concat!(
            "SELECT count(*)",
            " FROM vaccinations JOIN livestock ON livestock.livestock_id = vaccinations.animal_id",
            " WHERE livestock.owner_id = ?"
        ),
    },
    RouteDescriptor {
        route: Route::VetVisits,
        name: "vetVisits",
        entity_query: concat!(
            "SELECT vetvisit.livestock_id, vetvisit.visit_date, vetvisit.visit_id,",
            " vetvisit.vet_name, vetvisit.cost, vetvisit.reason, vetvisit.notes",
            " FROM vetvisit JOIN livestock ON livestock.livestock_id = vetvisit.livestock_id",
            " WHERE livestock.owner_id = ? ORDER BY vetvisit.visit_id LIMIT ?, ?"
        ),
        count_query: concat!(
            "SELECT count(*)",
            " FROM vetvisit JOIN livestock ON livestock.livestock_id = vetvisit.livestock_id",
            " WHERE livestock.owner_id = ?"
        ),
    },
    RouteDescriptor {
        route: Route::PastureMaintenance,
        name: "pastureMaintenance",
        entity_query: concat!(
            "SELECT pasture_maintenance.maintenance_id, pasture_maintenance.location,",
            " pasture_maintenance.maintenance_type, pasture_maintenance.cost,",
            " pasture_maintenance.notes",
            " FROM pasture_maintenance",
            " JOIN pastures ON pastures.pasture_id = pasture_maintenance.location",
            " WHERE pastures.owner_id = ? ORDER BY pasture_maintenance.maintenance_id LIMIT ?, ?"
        ),
        // Counts the same join as the entity query so page math covers maintenance rows.
        count_query: concat!(
            "SELECT count(*)",
            " FROM pasture_maintenance",
            " JOIN pastures ON pastures.pasture_id = pasture_maintenance.location",
            " WHERE pastures.owner_id = ?"
        ),
    },
    RouteDescriptor {
        route: Route::Medication,
        name: "medication",
        entity_query: concat!(
            "SELECT medication.livestock_id, medication.med_id, medication.medication_name,",
            " medication.start_date, medication.end_date, medication.med_interval",
            " FROM medication JOIN livestock ON livestock.livestock_id = medication.livestock_id",
            " WHERE livestock.owner_id = ? ORDER BY medication.med_id LIMIT ?, ?"
        ),
        count_query: concat!(
            "SELECT count(*)",
            " FROM medication JOIN livestock ON livestock.livestock_id = medication.livestock_id",
            " WHERE livestock.owner_id = ?"
        ),
    },
    RouteDescriptor {
        route: Route::Calves,
        name: "calves",
        entity_query: concat!(
            "SELECT calves.calf_id, calves.cow_id, calves.sired_id, calves.calf_subtype,",
            " calves.vaccine_complete, calves.water_complete, calves.feeder_complete",
            " FROM calves JOIN livestock ON calves.calf_id = livestock.livestock_id",
            " WHERE livestock.owner_id = ? ORDER BY calves.calf_id LIMIT ?, ?"
        ),
        count_query: concat!(
            "SELECT count(*)",
            " FROM calves JOIN livestock ON calves.calf_id = livestock.livestock_id",
            " WHERE livestock.owner_id = ?"
        ),
    },
    RouteDescriptor {
        route: Route::Pastures,
        name: "pastures",
        entity_query: "SELECT * FROM pastures WHERE owner_id = ? ORDER BY pasture_id LIMIT ?, ?",
        count_query: "SELECT count(*) FROM pastures WHERE owner_id = ?",
    },
];

/// Looks up a route's descriptor by wire name.
pub fn lookup(name: &str) -> Result<&'static RouteDescriptor> {
    DESCRIPTORS
        .iter()
        .find(|descriptor| descriptor.name == name)
        .ok_or_else(|| FarmError::unknown_route(name))
}

/// Counts positional `?` placeholders in a statement.
pub fn placeholder_count(sql: &str) -> usize {
    sql.matches('?').count()
}
