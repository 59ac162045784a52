//! The headless demo colony hosting the citizen AIs.
//!
//! A [`Colony`] owns everything the citizens share: the structures on the
//! site, the [`WorkManager`], the request system with the deliverymen's task
//! queues and each citizen's vitals. Agents reach it through a
//! [`SharedColony`] handle; the scheduler ticks agents one at a time, so a
//! borrow never outlives a single predicate or action.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use colony_core::config::ColonyConfig;
use colony_jobs::{JobDeliveryman, RequestSystem, StandardRequestSystem};
use colony_types::{CitizenId, CitizenState, RequestState, TaskToken, WorkOrderId, WorkOrderView};
use colony_workorders::{
    BuildOrder, ColonyContext, ColonyTickReport, Compound, DecorationOrder, PersistError,
    WorkManager, WorkManagerError, WorkOrder, WorkOrderRegistry, create_work_order_view,
    serialize_view_network_data,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Handle through which agents reach their colony.
pub type SharedColony = Rc<RefCell<Colony>>;

/// Structures standing when the colony is founded.
pub const STARTING_STRUCTURES: [&str; 5] = ["townhall", "warehouse", "bakery", "sawmill", "well"];

const DECORATION_SCHEMATICS: [&str; 4] = ["fountain", "flowerbed", "statue", "lantern"];

/// Hunger at which a citizen wants to stop and eat.
pub const HUNGER_LIMIT: u32 = 120;

/// Fatigue at which a citizen wants to sleep.
pub const FATIGUE_LIMIT: u32 = 160;

const MEAL: u32 = 30;
const REST: u32 = 40;

const NEW_ORDER_CHANCE: f64 = 0.6;
const BUILD_ORDER_CHANCE: f64 = 0.7;
const DEMOLITION_CHANCE: f64 = 0.05;
const NEW_REQUEST_CHANCE: f64 = 0.7;
const CANCEL_CHANCE: f64 = 0.1;
const MAX_UPGRADE_LEVEL: u32 = 5;

const TAG_WORK_MANAGER: &str = "workManager";
const TAG_DELIVERYMEN: &str = "deliverymen";
const TAG_REQUESTS: &str = "requestSystem";

/// Hunger and fatigue of one citizen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vitals {
    /// Grows every tick the citizen is not eating.
    pub hunger: u32,
    /// Grows every tick the citizen spends working.
    pub fatigue: u32,
}

/// Structures and builders of the colony, as seen by work orders.
#[derive(Debug, Clone, Default)]
pub struct Site {
    structures: BTreeSet<String>,
    builders: Vec<CitizenId>,
}

impl Site {
    /// Structures currently standing.
    pub fn structures(&self) -> impl Iterator<Item = &str> {
        self.structures.iter().map(String::as_str)
    }

    /// Registered builders in hiring order.
    pub fn builders(&self) -> &[CitizenId] {
        &self.builders
    }
}

impl ColonyContext for Site {
    fn structure_exists(&self, structure: &str) -> bool {
        self.structures.contains(structure)
    }

    fn available_builders(&self) -> Vec<CitizenId> {
        self.builders.clone()
    }
}

/// Everything the citizens of one colony share.
#[derive(Debug)]
pub struct Colony {
    name: String,
    site: Site,
    work: WorkManager,
    requests: StandardRequestSystem,
    deliverymen: BTreeMap<CitizenId, JobDeliveryman>,
    vitals: BTreeMap<CitizenId, Vitals>,
    may_eat: BTreeSet<CitizenId>,
    rng: StdRng,
}

impl Colony {
    /// Found a colony with the starting structures and no citizens.
    pub fn new(config: &ColonyConfig) -> Self {
        Self {
            name: config.name.clone(),
            site: Site {
                structures: STARTING_STRUCTURES.iter().map(ToString::to_string).collect(),
                builders: Vec::new(),
            },
            work: WorkManager::new(),
            requests: StandardRequestSystem::new(),
            deliverymen: BTreeMap::new(),
            vitals: BTreeMap::new(),
            may_eat: BTreeSet::new(),
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Wrap the colony in a shared handle.
    pub fn into_shared(self) -> SharedColony {
        Rc::new(RefCell::new(self))
    }

    /// Colony name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The site.
    pub const fn site(&self) -> &Site {
        &self.site
    }

    /// The colony's work orders.
    pub const fn work(&self) -> &WorkManager {
        &self.work
    }

    /// The colony's work orders, mutably.
    pub const fn work_mut(&mut self) -> &mut WorkManager {
        &mut self.work
    }

    /// The request system.
    pub const fn requests(&self) -> &StandardRequestSystem {
        &self.requests
    }

    /// The request system, mutably.
    pub const fn requests_mut(&mut self) -> &mut StandardRequestSystem {
        &mut self.requests
    }

    /// Hire `citizen` as a builder.
    pub fn add_builder(&mut self, citizen: CitizenId) {
        if !self.site.builders.contains(&citizen) {
            self.site.builders.push(citizen);
        }
        self.vitals.entry(citizen).or_default();
    }

    /// Hire `citizen` as a deliveryman, giving them a fresh task queue.
    pub fn add_deliveryman(&mut self, citizen: CitizenId) {
        let job = JobDeliveryman::new(citizen, &mut self.requests);
        self.deliverymen.insert(citizen, job);
        self.vitals.entry(citizen).or_default();
    }

    /// Remove a citizen from every role, releasing their claims and
    /// cancelling their queued deliveries.
    pub fn dismiss(&mut self, citizen: CitizenId) {
        self.site.builders.retain(|builder| *builder != citizen);
        let released = self.work.clear_work_for_citizen(citizen);
        if let Some(job) = self.deliverymen.remove(&citizen) {
            for token in job.task_queue(&self.requests) {
                self.requests.update_request_state(token, RequestState::Cancelled);
            }
            let _ = self.requests.data_stores_mut().remove(job.data_store_token());
        }
        self.vitals.remove(&citizen);
        self.may_eat.remove(&citizen);
        info!(%citizen, released, "citizen dismissed");
    }

    /// The deliveryman job held by `citizen`.
    pub fn deliveryman(&self, citizen: CitizenId) -> Option<&JobDeliveryman> {
        self.deliverymen.get(&citizen)
    }

    /// Run `f` on `citizen`'s deliveryman job and the request system.
    pub fn with_job<R>(
        &mut self,
        citizen: CitizenId,
        f: impl FnOnce(&JobDeliveryman, &mut StandardRequestSystem) -> R,
    ) -> Option<R> {
        let job = self.deliverymen.get(&citizen)?;
        Some(f(job, &mut self.requests))
    }

    /// Current vitals of `citizen`.
    pub fn vitals(&self, citizen: CitizenId) -> Vitals {
        self.vitals.get(&citizen).copied().unwrap_or_default()
    }

    /// Per-tick vitals update from the citizen's committed state and the
    /// okay-to-eat flag of their active target.
    pub fn update_vitals(&mut self, citizen: CitizenId, state: CitizenState, okay_to_eat: bool) {
        let vitals = self.vitals.entry(citizen).or_default();
        if state != CitizenState::Eating {
            vitals.hunger = vitals.hunger.saturating_add(1);
        }
        if matches!(
            state,
            CitizenState::Building | CitizenState::PrepareDelivery | CitizenState::Delivery
        ) {
            vitals.fatigue = vitals.fatigue.saturating_add(1);
        }
        if okay_to_eat {
            self.may_eat.insert(citizen);
        } else {
            self.may_eat.remove(&citizen);
        }
    }

    /// Whether `citizen` is hungry and free to break for a meal.
    pub fn wants_to_eat(&self, citizen: CitizenId) -> bool {
        self.may_eat.contains(&citizen) && self.vitals(citizen).hunger >= HUNGER_LIMIT
    }

    /// Whether `citizen` is worn out and free to go to bed.
    pub fn wants_to_sleep(&self, citizen: CitizenId) -> bool {
        self.may_eat.contains(&citizen) && self.vitals(citizen).fatigue >= FATIGUE_LIMIT
    }

    /// Eat one meal. Returns `true` once the citizen is no longer hungry.
    pub fn eat(&mut self, citizen: CitizenId) -> bool {
        let vitals = self.vitals.entry(citizen).or_default();
        vitals.hunger = vitals.hunger.saturating_sub(MEAL);
        vitals.hunger == 0
    }

    /// Sleep for a while. Returns `true` once the citizen is rested.
    pub fn rest(&mut self, citizen: CitizenId) -> bool {
        let vitals = self.vitals.entry(citizen).or_default();
        vitals.fatigue = vitals.fatigue.saturating_sub(REST);
        vitals.fatigue == 0
    }

    /// The order `citizen` has claimed, if any.
    pub fn claimed_order(&self, citizen: CitizenId) -> Option<WorkOrderId> {
        self.work.orders_claimed_by(citizen).next().map(|order| order.id())
    }

    /// Finish and remove an order. Returns `false` if it no longer exists.
    pub fn complete_order(&mut self, id: WorkOrderId) -> bool {
        let Some(order) = self.work.remove_work_order(id) else {
            return false;
        };
        info!(
            colony = %self.name,
            order = %id,
            kind = order.kind(),
            value = %order.value(),
            citizen = ?order.claimed_by(),
            "work order completed"
        );
        true
    }

    /// Roll a success with probability `chance`.
    pub fn roll(&mut self, chance: f64) -> bool {
        self.rng.random_bool(chance.clamp(0.0, 1.0))
    }

    /// Add a work order, open a delivery request, then sweep and dispatch
    /// the work orders.
    pub fn colony_tick(&mut self) -> Result<ColonyTickReport, WorkManagerError> {
        self.generate_work()?;
        self.generate_requests();
        Ok(self.work.on_colony_tick(&self.site))
    }

    fn generate_work(&mut self) -> Result<(), WorkManagerError> {
        if self.site.structures.len() > 2 && self.rng.random_bool(DEMOLITION_CHANCE) {
            if let Some(structure) = pick(&mut self.rng, &self.site.structures).cloned() {
                self.site.structures.remove(&structure);
                warn!(colony = %self.name, %structure, "structure demolished");
            }
        }

        if !self.rng.random_bool(NEW_ORDER_CHANCE) {
            return Ok(());
        }
        if self.rng.random_bool(BUILD_ORDER_CHANCE) {
            let Some(structure) = pick(&mut self.rng, &self.site.structures).cloned() else {
                return Ok(());
            };
            let level = self.rng.random_range(1..=MAX_UPGRADE_LEVEL);
            let id = self
                .work
                .add_work_order(Box::new(BuildOrder::new(structure, "level", level)))?;
            debug!(order = %id, "build order posted");
        } else {
            let Some(schematic) = pick(&mut self.rng, &DECORATION_SCHEMATICS).copied() else {
                return Ok(());
            };
            let name = format!("{schematic} by the {}", self.name);
            let id = self
                .work
                .add_work_order(Box::new(DecorationOrder::new(schematic, name)))?;
            debug!(order = %id, "decoration order posted");
        }
        Ok(())
    }

    fn generate_requests(&mut self) {
        if self.rng.random_bool(CANCEL_CHANCE) {
            let open: Vec<TaskToken> = self.requests.open_requests().collect();
            if let Some(token) = pick(&mut self.rng, &open).copied() {
                self.requests.update_request_state(token, RequestState::Cancelled);
            }
        }

        if self.deliverymen.is_empty() || !self.rng.random_bool(NEW_REQUEST_CHANCE) {
            return;
        }
        let requests = &self.requests;
        let Some(job) = self
            .deliverymen
            .values()
            .min_by_key(|job| job.task_queue(requests).len())
        else {
            return;
        };
        let token = self.requests.create_request();
        job.add_request(token, &mut self.requests);
        self.requests.update_request_state(token, RequestState::Assigned);
        debug!(request = %token, citizen = %job.citizen(), "delivery request assigned");
    }

    /// Client views of orders whose claim state changed since the last
    /// call, as a client would decode them off the wire.
    pub fn publish_changes(&mut self) -> Vec<WorkOrderView> {
        let changed = self.work.take_changed();
        let mut views = Vec::with_capacity(changed.len());
        for id in changed {
            let Some(order) = self.work.get(id) else {
                continue;
            };
            match serialize_view_network_data(order) {
                Ok(bytes) => views.extend(create_work_order_view(&bytes)),
                Err(error) => warn!(order = %id, %error, "work order view not encodable"),
            }
        }
        views
    }

    /// Persist the work orders, the request system with every delivery
    /// queue, and the deliveryman jobs.
    pub fn snapshot(&self, registry: &WorkOrderRegistry) -> Result<Compound, PersistError> {
        let mut compound = Compound::new();
        compound.insert(
            TAG_WORK_MANAGER.into(),
            Value::Object(self.work.write_to_compound(registry)?),
        );
        compound.insert(TAG_REQUESTS.into(), self.requests.to_value());
        compound.insert(
            TAG_DELIVERYMEN.into(),
            Value::Array(self.deliverymen.values().map(JobDeliveryman::to_value).collect()),
        );
        Ok(compound)
    }

    /// Restore the work orders, request system and deliveryman jobs written
    /// by [`snapshot`](Self::snapshot) into this colony, replacing its own.
    /// Entries that cannot be restored are skipped. Returns the number of
    /// jobs restored.
    pub fn restore(&mut self, registry: &WorkOrderRegistry, compound: &Compound) -> usize {
        if let Some(work) = compound.get(TAG_WORK_MANAGER).and_then(Value::as_object) {
            self.work = WorkManager::read_from_compound(registry, work);
        }

        // Jobs only hold store tokens, so the stores must be back first.
        match compound.get(TAG_REQUESTS).cloned() {
            Some(value) => match StandardRequestSystem::from_value(value) {
                Ok(requests) => self.requests = requests,
                Err(error) => warn!(%error, "request system unreadable; delivery queues start empty"),
            },
            None => warn!("snapshot has no request system; delivery queues start empty"),
        }

        let jobs = compound
            .get(TAG_DELIVERYMEN)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        self.deliverymen.clear();
        for value in jobs {
            match JobDeliveryman::from_value(value, &mut self.requests) {
                Ok(job) => {
                    self.vitals.entry(job.citizen()).or_default();
                    self.deliverymen.insert(job.citizen(), job);
                }
                Err(error) => warn!(%error, "skipping unreadable deliveryman record"),
            }
        }
        self.deliverymen.len()
    }
}

fn pick<'a, T>(rng: &mut StdRng, items: impl IntoIterator<Item = &'a T>) -> Option<&'a T> {
    let items: Vec<&T> = items.into_iter().collect();
    if items.is_empty() {
        return None;
    }
    let index = rng.random_range(0..items.len());
    items.get(index).copied()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn citizen(raw: u32) -> CitizenId {
        CitizenId::new(raw).unwrap()
    }

    fn colony() -> Colony {
        Colony::new(&ColonyConfig::default())
    }

    #[test]
    fn site_answers_work_order_queries() {
        let mut colony = colony();
        colony.add_builder(citizen(1));
        colony.add_builder(citizen(1));
        assert!(colony.site().structure_exists("bakery"));
        assert!(!colony.site().structure_exists("castle"));
        assert_eq!(colony.site().available_builders(), vec![citizen(1)]);
    }

    #[test]
    fn hunger_needs_the_okay_to_eat_flag() {
        let mut colony = colony();
        let c = citizen(1);
        colony.add_builder(c);
        for _ in 0..HUNGER_LIMIT {
            colony.update_vitals(c, CitizenState::Building, false);
        }
        assert!(!colony.wants_to_eat(c));
        colony.update_vitals(c, CitizenState::Building, true);
        assert!(colony.wants_to_eat(c));

        while !colony.eat(c) {}
        assert_eq!(colony.vitals(c).hunger, 0);
    }

    #[test]
    fn eating_does_not_raise_hunger() {
        let mut colony = colony();
        let c = citizen(2);
        colony.update_vitals(c, CitizenState::Eating, false);
        colony.update_vitals(c, CitizenState::Idle, true);
        assert_eq!(colony.vitals(c), Vitals { hunger: 1, fatigue: 0 });
    }

    #[test]
    fn colony_tick_hands_orders_to_builders() {
        let mut colony = colony();
        colony.site.structures = ["well", "bakery"].iter().map(ToString::to_string).collect();
        colony.add_builder(citizen(1));
        colony
            .work_mut()
            .add_work_order(Box::new(BuildOrder::new("well", "level", 2)))
            .unwrap();

        let report = colony.colony_tick().unwrap();
        assert!(report.claimed.iter().any(|(_, who)| *who == citizen(1)));
        assert!(colony.claimed_order(citizen(1)).is_some());
    }

    #[test]
    fn published_views_reflect_claims() {
        let mut colony = colony();
        colony.add_builder(citizen(3));
        let id = colony
            .work_mut()
            .add_work_order(Box::new(DecorationOrder::new("statue", "Founders' statue")))
            .unwrap();
        let _ = colony.work_mut().on_colony_tick(&Site {
            structures: BTreeSet::new(),
            builders: vec![citizen(3)],
        });

        let views = colony.publish_changes();
        assert_eq!(views.len(), 1);
        let view = views.first().unwrap();
        assert_eq!(view.id, id);
        assert_eq!(view.claimed_by, Some(citizen(3)));
        assert_eq!(view.value, "Founders' statue");
        assert!(colony.publish_changes().is_empty());
    }

    #[test]
    fn dismiss_releases_claims_and_cancels_deliveries() {
        let mut colony = colony();
        let builder = citizen(1);
        let courier = citizen(2);
        colony.add_builder(builder);
        colony.add_deliveryman(courier);
        colony
            .work_mut()
            .add_work_order(Box::new(BuildOrder::new("well", "level", 1)))
            .unwrap();
        let _ = colony.colony_tick().unwrap();
        let token = colony.requests_mut().create_request();
        colony
            .with_job(courier, |job, rs| job.add_request(token, rs))
            .unwrap();

        colony.dismiss(builder);
        colony.dismiss(courier);
        assert!(colony.claimed_order(builder).is_none());
        assert!(colony.deliveryman(courier).is_none());
        assert_eq!(
            colony.requests().request_state(token),
            Some(RequestState::Cancelled)
        );
    }

    #[test]
    fn snapshot_restores_orders_and_jobs() {
        let registry = WorkOrderRegistry::standard().unwrap();
        let mut colony = colony();
        let courier = citizen(4);
        colony.add_deliveryman(courier);
        colony
            .work_mut()
            .add_work_order(Box::new(BuildOrder::new("sawmill", "level", 3)))
            .unwrap();
        let (first, second) = (
            colony.requests_mut().create_request(),
            colony.requests_mut().create_request(),
        );
        colony
            .with_job(courier, |job, rs| {
                job.add_request(first, rs);
                job.add_request(second, rs);
                job.set_returning(true, rs);
            })
            .unwrap();
        colony
            .requests_mut()
            .update_request_state(first, RequestState::Assigned);
        let snapshot = colony.snapshot(&registry).unwrap();

        let mut restored = Colony::new(&ColonyConfig::default());
        assert_eq!(restored.restore(&registry, &snapshot), 1);
        assert_eq!(restored.work().len(), 1);
        assert_eq!(restored.work().top_id(), 1);
        assert_eq!(
            restored.deliveryman(courier).map(JobDeliveryman::data_store_token),
            colony.deliveryman(courier).map(JobDeliveryman::data_store_token)
        );

        let job = restored.deliveryman(courier).unwrap();
        assert_eq!(job.task_queue(restored.requests()), vec![first, second]);
        assert!(job.has_task(restored.requests()));
        assert!(job.is_returning(restored.requests()));
        assert_eq!(
            restored.requests().request_state(first),
            Some(RequestState::Assigned)
        );
        assert_eq!(
            restored.requests().request_state(second),
            Some(RequestState::Created)
        );
    }
}
