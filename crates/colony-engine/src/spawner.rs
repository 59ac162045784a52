//! Citizen spawner for seeding the demo colony.
//!
//! At startup the spawner hires the configured number of builders and
//! deliverymen, gives each a name from the pool, registers their job with
//! the colony and their AI with the scheduler. Citizen ids are handed out
//! from 1 upwards, builders first.

use colony_core::config::ColonyConfig;
use colony_core::scheduler::Scheduler;
use colony_types::{CitizenId, CitizenState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::citizens::{Role, citizen_agent};
use crate::colony::SharedColony;
use crate::error::EngineError;

// -----------------------------------------------------------------------
// Name pool
// -----------------------------------------------------------------------

/// Built-in pool of citizen names. The spawner samples without replacement
/// and falls back to numbered names once the pool runs dry.
const NAME_POOL: &[&str] = &[
    "Alder", "Birch", "Cedar", "Dusk", "Ember", "Fern", "Grove", "Haze",
    "Iris", "Juniper", "Kestrel", "Lark", "Moss", "Nettle", "Oak", "Pine",
    "Quill", "Reed", "Sage", "Thorn", "Umber", "Vale", "Wren", "Yarrow",
];

// -----------------------------------------------------------------------
// Spawning result
// -----------------------------------------------------------------------

/// One hired citizen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnedCitizen {
    /// The citizen's id.
    pub id: CitizenId,
    /// Display name.
    pub name: String,
    /// The job they were hired for.
    pub role: Role,
}

/// Hire the configured citizens into `colony` and register their agents.
///
/// # Errors
///
/// Returns [`EngineError::Spawner`] if the head count does not fit the
/// citizen id range.
pub fn spawn_citizens(
    config: &ColonyConfig,
    colony: &SharedColony,
    scheduler: &mut Scheduler<CitizenState>,
) -> Result<Vec<SpawnedCitizen>, EngineError> {
    let total = config
        .builders
        .checked_add(config.deliverymen)
        .ok_or_else(|| EngineError::Spawner {
            message: format!(
                "{} builders and {} deliverymen exceed the citizen id range",
                config.builders, config.deliverymen
            ),
        })?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let names = pick_names(&mut rng, total)?;

    let roles = std::iter::repeat_n(Role::Builder, usize_from(config.builders)?)
        .chain(std::iter::repeat_n(Role::Deliveryman, usize_from(config.deliverymen)?));

    let mut spawned = Vec::with_capacity(names.len());
    for ((raw, name), role) in (1..=total).zip(names).zip(roles) {
        let id = CitizenId::new(raw).ok_or_else(|| EngineError::Spawner {
            message: format!("citizen id {raw} is reserved"),
        })?;

        {
            let mut host = colony.borrow_mut();
            match role {
                Role::Builder => host.add_builder(id),
                Role::Deliveryman => host.add_deliveryman(id),
            }
        }
        let agent = citizen_agent(role, id, SharedColony::clone(colony));
        let _ = scheduler.register(id, Box::new(agent));

        info!(citizen = %id, %name, ?role, "citizen hired");
        spawned.push(SpawnedCitizen { id, name, role });
    }

    info!(
        colony = %colony.borrow().name(),
        builders = config.builders,
        deliverymen = config.deliverymen,
        "citizens spawned"
    );
    Ok(spawned)
}

fn usize_from(count: u32) -> Result<usize, EngineError> {
    usize::try_from(count).map_err(|_conversion_err| EngineError::Spawner {
        message: format!("head count {count} exceeds usize range"),
    })
}

/// Pick `count` names, unique while the pool lasts.
fn pick_names<R: Rng>(rng: &mut R, count: u32) -> Result<Vec<String>, EngineError> {
    let count = usize_from(count)?;
    let pool_len = NAME_POOL.len();

    // Fisher-Yates partial shuffle over the pool indices.
    let mut indices: Vec<usize> = (0..pool_len).collect();
    let shuffled = count.min(pool_len);
    for i in 0..shuffled {
        let j = rng.random_range(i..pool_len);
        indices.swap(i, j);
    }

    let mut names = Vec::with_capacity(count);
    for &idx in indices.iter().take(shuffled) {
        let name = NAME_POOL
            .get(idx)
            .map(|s| String::from(*s))
            .ok_or_else(|| EngineError::Spawner {
                message: format!("name pool index {idx} out of bounds"),
            })?;
        names.push(name);
    }
    for n in shuffled..count {
        names.push(format!("Citizen-{}", n.saturating_add(1)));
    }
    Ok(names)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use colony_workorders::ColonyContext;

    use super::*;
    use crate::colony::Colony;

    #[test]
    fn hires_builders_then_deliverymen() {
        let config = ColonyConfig {
            builders: 2,
            deliverymen: 3,
            ..ColonyConfig::default()
        };
        let colony = Colony::new(&config).into_shared();
        let mut scheduler: Scheduler<CitizenState> = Scheduler::new();

        let spawned = spawn_citizens(&config, &colony, &mut scheduler).unwrap();
        assert_eq!(spawned.len(), 5);
        assert_eq!(scheduler.len(), 5);
        let roles: Vec<Role> = spawned.iter().map(|c| c.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::Builder,
                Role::Builder,
                Role::Deliveryman,
                Role::Deliveryman,
                Role::Deliveryman
            ]
        );
        assert_eq!(spawned.first().unwrap().id.get(), 1);

        let host = colony.borrow();
        assert_eq!(host.site().available_builders().len(), 2);
        assert!(host.deliveryman(CitizenId::new(5).unwrap()).is_some());
        assert_eq!(
            scheduler.current_state(CitizenId::new(3).unwrap()),
            Some(CitizenState::Init)
        );
    }

    #[test]
    fn names_are_unique_and_seeded() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        let first = pick_names(&mut a, 10).unwrap();
        assert_eq!(first, pick_names(&mut b, 10).unwrap());
        assert_eq!(first.iter().collect::<BTreeSet<_>>().len(), 10);
    }

    #[test]
    fn large_colonies_get_numbered_names() {
        let mut rng = StdRng::seed_from_u64(1);
        let names = pick_names(&mut rng, 30).unwrap();
        assert_eq!(names.len(), 30);
        assert_eq!(names.last().map(String::as_str), Some("Citizen-30"));
        assert_eq!(names.iter().collect::<BTreeSet<_>>().len(), 30);
    }
}
