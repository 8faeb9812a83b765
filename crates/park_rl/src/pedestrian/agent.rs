//! A single pedestrian and its behaviour state machine.
//!
//! Each tick an agent refreshes its thermal discomfort, recovers if it has
//! been stuck, lets the heat redirect it towards shade or a fountain, and then
//! runs the logic of its current state. There is no terminal state; only the
//! [`AgentManager`](super::AgentManager) ends an agent's life.

use crate::config::PedestrianConfig;
use crate::environment::{ElementId, ElementType, Park};
use crate::types::Position;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Identifier assigned by the agent manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

/// What a pedestrian is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Wandering,
    MovingToTarget,
    Resting,
    SeekingShade,
    SeekingCoolness,
    SittingOnBench,
}

impl AgentState {
    pub const ALL: [AgentState; 6] = [
        AgentState::Wandering,
        AgentState::MovingToTarget,
        AgentState::Resting,
        AgentState::SeekingShade,
        AgentState::SeekingCoolness,
        AgentState::SittingOnBench,
    ];

    /// States watched by stuck detection: every state except sitting, so a
    /// rest that outlasts the stuck threshold also ends in a teleport.
    pub fn tracks_stuck(&self) -> bool {
        !matches!(self, AgentState::SittingOnBench)
    }
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AgentState::Wandering => "wandering",
            AgentState::MovingToTarget => "moving_to_target",
            AgentState::Resting => "resting",
            AgentState::SeekingShade => "seeking_shade",
            AgentState::SeekingCoolness => "seeking_coolness",
            AgentState::SittingOnBench => "sitting_on_bench",
        };
        f.write_str(name)
    }
}

/// Non-owning reference to the bench an agent sits on.
///
/// The park owns the bench; the agent re-checks that the id still resolves
/// to a bench at the same spot before trusting it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchRef {
    pub id: ElementId,
    pub position: Position,
}

/// Result of one movement step.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    Arrived,
    Moved,
    Blocked,
    GaveUp,
    NoTarget,
}

/// A simulated park visitor.
#[derive(Debug, Clone)]
pub struct PedestrianAgent {
    id: AgentId,
    position: Position,
    last_position: Position,
    target: Option<Position>,
    state: AgentState,
    speed: f64,
    rest_timer: f64,
    rest_duration: f64,
    sitting_timer: f64,
    sitting_duration: f64,
    blocked_timer: f64,
    time_since_move: f64,
    heat_tolerance: f64,
    cold_tolerance: f64,
    discomfort: f64,
    time_in_discomfort: f64,
    current_bench: Option<BenchRef>,
    teleports: u32,
}

impl PedestrianAgent {
    /// Creates a wandering agent with traits sampled from `config`.
    pub fn new<R: Rng + ?Sized>(
        id: AgentId,
        position: Position,
        config: &PedestrianConfig,
        rng: &mut R,
    ) -> Self {
        let position = position.on_ground();
        Self {
            id,
            position,
            last_position: position,
            target: None,
            state: AgentState::Wandering,
            speed: config.speed.sample(rng),
            rest_timer: 0.0,
            rest_duration: config.rest_duration.sample(rng),
            sitting_timer: 0.0,
            sitting_duration: config.sit_duration.sample(rng),
            blocked_timer: 0.0,
            time_since_move: 0.0,
            heat_tolerance: config.tolerance.sample(rng),
            cold_tolerance: config.tolerance.sample(rng),
            discomfort: 0.0,
            time_in_discomfort: 0.0,
            current_bench: None,
            teleports: 0,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn target(&self) -> Option<Position> {
        self.target
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn heat_tolerance(&self) -> f64 {
        self.heat_tolerance
    }

    pub fn cold_tolerance(&self) -> f64 {
        self.cold_tolerance
    }

    /// Thermal discomfort in `[0, 1]`.
    pub fn discomfort(&self) -> f64 {
        self.discomfort
    }

    /// Seconds spent continuously uncomfortable.
    pub fn time_in_discomfort(&self) -> f64 {
        self.time_in_discomfort
    }

    pub fn current_bench(&self) -> Option<BenchRef> {
        self.current_bench
    }

    pub fn is_sitting(&self) -> bool {
        self.state == AgentState::SittingOnBench
    }

    /// Number of times stuck recovery has moved this agent.
    pub fn teleports(&self) -> u32 {
        self.teleports
    }

    /// Leaves the bench, if seated: back to ground level and wandering.
    pub fn stand_up(&mut self) {
        if self.current_bench.take().is_some() || self.state == AgentState::SittingOnBench {
            self.position = self.position.on_ground();
            self.last_position = self.position;
            self.sitting_timer = 0.0;
            self.state = AgentState::Wandering;
            self.target = None;
        }
    }

    /// Advances the agent by `dt` seconds.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        park: &Park,
        config: &PedestrianConfig,
        rng: &mut R,
    ) {
        self.validate_bench(park);
        self.update_discomfort(dt, park, config);

        if self.state.tracks_stuck() {
            if self.position.distance_2d(&self.last_position) < config.stuck_epsilon {
                self.time_since_move += dt;
            } else {
                self.time_since_move = 0.0;
                self.last_position = self.position;
            }
            if self.time_since_move > config.stuck_threshold {
                self.force_unstuck(park, config, rng);
            }
        } else {
            self.time_since_move = 0.0;
            self.last_position = self.position;
        }

        self.apply_thermal_override(park, config);

        match self.state {
            AgentState::Wandering => self.wander(park, config, rng),
            AgentState::MovingToTarget => match self.step(dt, park, config) {
                Step::Arrived => self.handle_arrival(park, config, rng),
                Step::GaveUp | Step::NoTarget => self.give_up(),
                Step::Moved | Step::Blocked => {}
            },
            AgentState::Resting => self.rest(dt, config),
            AgentState::SittingOnBench => self.sit(dt, config),
            AgentState::SeekingShade => self.seek_shade(dt, park, config, rng),
            AgentState::SeekingCoolness => self.seek_coolness(dt, park, config, rng),
        }
    }

    /// Stands the agent up if its bench no longer exists where it was.
    fn validate_bench(&mut self, park: &Park) {
        let Some(bench) = self.current_bench else {
            return;
        };
        let still_there = park.element(bench.id).is_some_and(|e| {
            e.element_type == ElementType::Bench && e.position == bench.position
        });
        if !still_there {
            self.stand_up();
        }
    }

    fn update_discomfort(&mut self, dt: f64, park: &Park, config: &PedestrianConfig) {
        let thermal = park.thermal_config();
        let temperature = park.effective_temperature_at(&self.position);
        let band = thermal.comfortable;
        let raw = if temperature > band.max {
            (temperature - band.max) / thermal.comfort_falloff / self.heat_tolerance
        } else if temperature < band.min {
            (band.min - temperature) / thermal.comfort_falloff / self.cold_tolerance
        } else {
            0.0
        };
        self.discomfort = raw.clamp(0.0, 1.0);
        if self.discomfort > config.discomfort_threshold {
            self.time_in_discomfort += dt;
        } else {
            self.time_in_discomfort = 0.0;
        }
    }

    fn apply_thermal_override(&mut self, park: &Park, config: &PedestrianConfig) {
        let eligible = matches!(
            self.state,
            AgentState::Wandering | AgentState::MovingToTarget | AgentState::SeekingShade
        );
        if !eligible {
            return;
        }

        let ambient = park.temperature();
        let threshold = config.shade_threshold * self.heat_tolerance;

        // Extreme heat escalates straight to a fountain. The dwell time and
        // the in-shade test only gate shade seeking, so an agent already under
        // a tree still leaves for a fountain.
        if ambient > threshold + config.coolness_margin
            && self.discomfort > config.coolness_discomfort
            && park.element_count(ElementType::Fountain) > 0
        {
            self.state = AgentState::SeekingCoolness;
            self.target = None;
            return;
        }

        if self.state != AgentState::SeekingShade
            && ambient > threshold
            && self.time_in_discomfort > config.discomfort_dwell
            && park.element_count(ElementType::Tree) > 0
            && !park.is_in_shade(&self.position)
        {
            self.state = AgentState::SeekingShade;
            self.target = None;
        }
    }

    fn wander<R: Rng + ?Sized>(&mut self, park: &Park, config: &PedestrianConfig, rng: &mut R) {
        let bench_probability = config.bench_seek_base + config.bench_seek_discomfort * self.discomfort;
        if rng.random::<f64>() < bench_probability {
            if let Some(bench) = park.nearest_of_type(&self.position, ElementType::Bench) {
                self.set_target(bench.position);
                return;
            }
        }

        let half = (park.size() / 2.0 - config.wander_margin).max(0.0);
        let uncomfortable = self.discomfort > config.discomfort_threshold;
        let mut best: Option<(Position, f64)> = None;
        for _ in 0..config.wander_attempts {
            let candidate = Position::new(rng.random_range(-half..=half), rng.random_range(-half..=half));
            if !is_walkable(park, &candidate, config.walk_clearance) {
                continue;
            }
            if !uncomfortable {
                best = Some((candidate, 0.0));
                break;
            }
            let comfort = park.thermal_comfort_at(&candidate);
            if best.is_none_or(|(_, c)| comfort > c) {
                best = Some((candidate, comfort));
            }
        }

        let target = match best {
            Some((position, _)) => position,
            None => {
                let inset = (park.size() / 2.0 - config.corner_inset).max(0.0);
                let corners = [
                    Position::new(inset, inset),
                    Position::new(-inset, inset),
                    Position::new(inset, -inset),
                    Position::new(-inset, -inset),
                ];
                corners.choose(rng).copied().unwrap_or_default()
            }
        };
        self.set_target(target);
    }

    fn set_target(&mut self, target: Position) {
        self.target = Some(target);
        self.state = AgentState::MovingToTarget;
        self.blocked_timer = 0.0;
    }

    fn give_up(&mut self) {
        self.state = AgentState::Wandering;
        self.target = None;
        self.blocked_timer = 0.0;
    }

    /// Moves towards the target, steering around obstacles when the direct
    /// step is blocked.
    fn step(&mut self, dt: f64, park: &Park, config: &PedestrianConfig) -> Step {
        let Some(target) = self.target else {
            return Step::NoTarget;
        };

        let dx = target.x - self.position.x;
        let dy = target.y - self.position.y;
        let distance = (dx * dx + dy * dy).sqrt();

        let near_bench = park
            .nearest_of_type(&self.position, ElementType::Bench)
            .is_some_and(|b| b.position.distance_2d(&self.position) <= config.sitting_range);
        let arrival = if near_bench {
            config.bench_arrival_radius
        } else {
            config.arrival_radius
        };
        if distance < arrival {
            self.blocked_timer = 0.0;
            return Step::Arrived;
        }

        let heading = dy.atan2(dx);
        let direct = self.position.offset_polar(heading, (self.speed * dt).min(distance));
        if is_walkable(park, &direct, config.walk_clearance) {
            self.position = direct;
            self.blocked_timer = 0.0;
            return Step::Moved;
        }

        let detour_distance = self.speed * dt * config.avoidance_speed_factor;
        for offset in &config.avoidance_angles {
            let candidate = self
                .position
                .offset_polar(heading + offset.to_radians(), detour_distance);
            if is_walkable(park, &candidate, config.walk_clearance) {
                self.position = candidate;
                return Step::Moved;
            }
        }

        self.blocked_timer += dt;
        if self.blocked_timer > config.blocked_give_up {
            Step::GaveUp
        } else {
            Step::Blocked
        }
    }

    fn handle_arrival<R: Rng + ?Sized>(
        &mut self,
        park: &Park,
        config: &PedestrianConfig,
        rng: &mut R,
    ) {
        self.target = None;

        if let Some(bench) = park
            .nearest_of_type(&self.position, ElementType::Bench)
            .filter(|b| b.position.distance_2d(&self.position) <= config.sitting_range)
        {
            let dx = self.position.x - bench.position.x;
            let dy = self.position.y - bench.position.y;
            let angle = if dx == 0.0 && dy == 0.0 { 0.0 } else { dy.atan2(dx) };
            let seat = bench
                .position
                .offset_polar(angle, bench.size / 2.0 + config.seat_offset);
            self.position = Position::with_z(seat.x, seat.y, config.seat_height);
            self.last_position = self.position;
            self.current_bench = Some(BenchRef {
                id: bench.id,
                position: bench.position,
            });
            self.sitting_timer = 0.0;
            self.sitting_duration = config.sit_duration.sample(rng);
            self.state = AgentState::SittingOnBench;
            return;
        }

        let thermal = park.thermal_config();
        let ambient = park.temperature();
        let hot = ambient > thermal.comfortable.max;
        let cold = ambient < thermal.comfortable.min;
        let shaded = park.is_in_shade(&self.position);

        let (mut probability, scale) = if hot && shaded {
            (config.rest_probability_hot_shaded, config.rest_scale_hot_shaded)
        } else if cold {
            (config.rest_probability_cold, config.rest_scale_cold)
        } else {
            (config.rest_probability, 1.0)
        };
        if !park
            .elements_near(&self.position, config.near_element_radius)
            .is_empty()
        {
            probability += config.rest_near_element_bonus;
        }

        if rng.random::<f64>() < probability {
            self.start_rest(config.rest_duration.sample(rng) * scale);
        } else {
            self.state = AgentState::Wandering;
        }
    }

    fn start_rest(&mut self, duration: f64) {
        self.state = AgentState::Resting;
        self.rest_timer = 0.0;
        self.rest_duration = duration;
        self.target = None;
    }

    fn rest(&mut self, dt: f64, config: &PedestrianConfig) {
        self.rest_timer += dt;
        let restless =
            self.discomfort > config.rest_end_discomfort && self.rest_timer > config.min_rest_time;
        if restless || self.rest_timer >= self.rest_duration {
            self.state = AgentState::Wandering;
            self.rest_timer = 0.0;
        }
    }

    fn sit(&mut self, dt: f64, config: &PedestrianConfig) {
        self.sitting_timer += dt;
        let too_uncomfortable =
            self.discomfort > config.stand_up_discomfort && self.sitting_timer > config.min_sit_time;
        if too_uncomfortable || self.sitting_timer >= self.sitting_duration {
            self.stand_up();
        }
    }

    fn seek_shade<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        park: &Park,
        config: &PedestrianConfig,
        rng: &mut R,
    ) {
        if park.is_in_shade(&self.position) {
            let duration = config.rest_duration.sample(rng) * config.rest_scale_shade;
            self.start_rest(duration);
            return;
        }
        if self.target.is_none() {
            match park.nearest_of_type(&self.position, ElementType::Tree) {
                Some(tree) => self.target = Some(tree.position),
                None => {
                    self.give_up();
                    self.wander(park, config, rng);
                    return;
                }
            }
        }
        match self.step(dt, park, config) {
            Step::GaveUp | Step::NoTarget => self.give_up(),
            Step::Arrived => {
                if park.is_in_shade(&self.position) {
                    let duration = config.rest_duration.sample(rng) * config.rest_scale_shade;
                    self.start_rest(duration);
                } else {
                    self.give_up();
                }
            }
            Step::Moved | Step::Blocked => {}
        }
    }

    fn seek_coolness<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        park: &Park,
        config: &PedestrianConfig,
        rng: &mut R,
    ) {
        if self.target.is_none() {
            match park.nearest_of_type(&self.position, ElementType::Fountain) {
                Some(fountain) => self.target = Some(fountain.position),
                None => {
                    self.state = AgentState::SeekingShade;
                    self.seek_shade(dt, park, config, rng);
                    return;
                }
            }
        }

        let near_fountain = park
            .nearest_of_type(&self.position, ElementType::Fountain)
            .is_some_and(|f| f.position.distance_2d(&self.position) <= config.coolness_arrival_radius);
        if near_fountain {
            let duration = config.rest_duration.sample(rng) * config.rest_scale_fountain;
            self.start_rest(duration);
            return;
        }

        match self.step(dt, park, config) {
            Step::GaveUp | Step::NoTarget => self.give_up(),
            Step::Arrived | Step::Moved | Step::Blocked => {}
        }
    }

    /// Moves a stuck agent to the first free spot on rings around it, or to
    /// a random point near the park edge if every ring is blocked.
    fn force_unstuck<R: Rng + ?Sized>(
        &mut self,
        park: &Park,
        config: &PedestrianConfig,
        rng: &mut R,
    ) {
        let from = self.position;
        let directions = config.teleport_directions.max(1);
        let landing = config
            .teleport_radii
            .iter()
            .flat_map(|radius| {
                (0..directions).map(move |k| (*radius, k as f64 * TAU / directions as f64))
            })
            .map(|(radius, angle)| from.offset_polar(angle, radius).on_ground())
            .find(|candidate| is_walkable(park, candidate, config.walk_clearance));

        self.position = match landing {
            Some(position) => position,
            None => edge_position(park.size() / 2.0 - config.edge_margin, rng),
        };
        log::warn!(
            "Agent {} stuck at {}, moved to {}",
            self.id.0,
            from,
            self.position
        );

        self.teleports += 1;
        self.last_position = self.position;
        self.time_since_move = 0.0;
        self.blocked_timer = 0.0;
        self.state = AgentState::Wandering;
        self.target = None;
    }
}

/// `true` if a walking pedestrian may stand at `position`: inside the park
/// and at least `clearance` meters clear of every element's footprint.
pub fn is_walkable(park: &Park, position: &Position, clearance: f64) -> bool {
    if !park.is_position_valid(position) {
        return false;
    }
    park.elements()
        .iter()
        .all(|e| position.distance_2d(&e.position) >= e.radius() + clearance)
}

/// A uniformly random point on the square of half-width `half` centred on
/// the origin.
pub fn edge_position<R: Rng + ?Sized>(half: f64, rng: &mut R) -> Position {
    let half = half.max(0.0);
    let along = rng.random_range(-half..=half);
    match rng.random_range(0..4) {
        0 => Position::new(along, half),
        1 => Position::new(along, -half),
        2 => Position::new(-half, along),
        _ => Position::new(half, along),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn agent_at(x: f64, y: f64, rng: &mut StdRng) -> PedestrianAgent {
        PedestrianAgent::new(AgentId(0), Position::new(x, y), &PedestrianConfig::default(), rng)
    }

    #[test]
    fn test_new_agent_samples_traits_in_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = PedestrianConfig::default();
        for i in 0..50 {
            let agent = PedestrianAgent::new(AgentId(i), Position::new(0.0, 0.0), &config, &mut rng);
            assert!(config.speed.contains(agent.speed()));
            assert!(config.tolerance.contains(agent.heat_tolerance()));
            assert!(config.tolerance.contains(agent.cold_tolerance()));
            assert_eq!(agent.state(), AgentState::Wandering);
        }
    }

    #[test]
    fn test_wander_picks_target_inside_margin() {
        let mut rng = StdRng::seed_from_u64(2);
        let park = Park::new(30.0, 3).unwrap();
        let config = PedestrianConfig::default();
        let mut agent = agent_at(0.0, 0.0, &mut rng);
        agent.update(0.1, &park, &config, &mut rng);
        assert_eq!(agent.state(), AgentState::MovingToTarget);
        let target = agent.target().unwrap();
        assert!(target.x.abs() <= 13.0 && target.y.abs() <= 13.0);
    }

    #[test]
    fn test_moves_towards_target_without_overshoot() {
        let mut rng = StdRng::seed_from_u64(3);
        let park = Park::new(30.0, 3).unwrap();
        let config = PedestrianConfig::default();
        let mut agent = agent_at(0.0, 0.0, &mut rng);
        agent.set_target(Position::new(5.0, 0.0));
        let step = agent.step(1.0, &park, &config);
        assert_eq!(step, Step::Moved);
        assert!((agent.position().x - agent.speed()).abs() < 1e-9);

        agent.set_target(Position::new(agent.position().x + 0.5, 0.0));
        agent.step(10.0, &park, &config);
        assert!((agent.position().x - agent.target().unwrap().x).abs() < 1e-9);
    }

    #[test]
    fn test_never_walks_into_elements() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut park = Park::new(30.0, 3).unwrap();
        park.add_element(ElementType::Fountain, 1, 1);
        park.add_element(ElementType::Tree, 0, 1);
        let config = PedestrianConfig::default();
        let mut agent = agent_at(-12.0, 0.0, &mut rng);
        for _ in 0..600 {
            agent.update(0.1, &park, &config, &mut rng);
            if !agent.is_sitting() {
                for e in park.elements() {
                    assert!(agent.position().distance_2d(&e.position) >= e.radius() + 0.4 - 1e-9);
                }
            }
            assert!(park.is_position_valid(&agent.position()));
        }
    }

    #[test]
    fn test_arrival_next_to_bench_sits() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut park = Park::new(30.0, 3).unwrap();
        let bench_id = park.add_element(ElementType::Bench, 1, 1).unwrap().id;
        let config = PedestrianConfig::default();
        let mut agent = agent_at(1.45, 0.0, &mut rng);
        agent.set_target(Position::new(0.0, 0.0));
        agent.update(0.1, &park, &config, &mut rng);

        assert_eq!(agent.state(), AgentState::SittingOnBench);
        assert_eq!(agent.current_bench().unwrap().id, bench_id);
        assert_eq!(agent.position().z, config.seat_height);
        assert!((agent.position().distance_2d(&Position::new(0.0, 0.0)) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_stands_up_when_bench_removed() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut park = Park::new(30.0, 3).unwrap();
        let bench_id = park.add_element(ElementType::Bench, 1, 1).unwrap().id;
        let config = PedestrianConfig::default();
        let mut agent = agent_at(1.45, 0.0, &mut rng);
        agent.set_target(Position::new(0.0, 0.0));
        agent.update(0.1, &park, &config, &mut rng);
        assert!(agent.is_sitting());

        park.remove_element(bench_id);
        agent.update(0.1, &park, &config, &mut rng);
        assert!(!agent.is_sitting());
        assert!(agent.current_bench().is_none());
        assert_eq!(agent.position().z, 0.0);
    }

    #[test]
    fn test_sitting_ends_after_duration() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut park = Park::new(30.0, 3).unwrap();
        park.add_element(ElementType::Bench, 1, 1);
        let config = PedestrianConfig::default();
        let mut agent = agent_at(1.45, 0.0, &mut rng);
        agent.set_target(Position::new(0.0, 0.0));
        agent.update(0.1, &park, &config, &mut rng);
        assert!(agent.is_sitting());
        for _ in 0..151 {
            agent.update(0.1, &park, &config, &mut rng);
            if !agent.is_sitting() {
                break;
            }
        }
        assert!(!agent.is_sitting());
        assert!(agent.current_bench().is_none());
    }

    #[test]
    fn test_stuck_agent_is_teleported() {
        let mut rng = StdRng::seed_from_u64(8);
        let park = Park::new(30.0, 3).unwrap();
        let config = PedestrianConfig::default();
        let mut agent = agent_at(0.0, 0.0, &mut rng);
        agent.state = AgentState::MovingToTarget;
        agent.target = Some(Position::new(5.0, 0.0));
        // Zero time steps never move the agent.
        for _ in 0..5 {
            agent.update(0.0, &park, &config, &mut rng);
        }
        assert_eq!(agent.teleports(), 0);
        agent.time_since_move = config.stuck_threshold;
        agent.update(0.5, &park, &config, &mut rng);
        assert_eq!(agent.teleports(), 1);
        assert!((agent.position().distance_2d(&Position::new(0.0, 0.0)) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_rest_counts_as_stuck() {
        let mut rng = StdRng::seed_from_u64(9);
        let park = Park::new(30.0, 3).unwrap();
        let config = PedestrianConfig::default();
        let mut agent = agent_at(0.0, 0.0, &mut rng);
        agent.start_rest(100.0);

        let mut ticks = 0;
        while agent.teleports() == 0 && ticks < 100 {
            agent.update(0.1, &park, &config, &mut rng);
            ticks += 1;
        }
        assert_eq!(agent.teleports(), 1);
        assert_ne!(agent.state(), AgentState::Resting);
        assert!(ticks as f64 * 0.1 > config.stuck_threshold);
    }

    #[test]
    fn test_sitting_does_not_count_as_stuck() {
        let mut rng = StdRng::seed_from_u64(19);
        let mut park = Park::new(30.0, 3).unwrap();
        park.add_element(ElementType::Bench, 1, 1);
        let mut config = PedestrianConfig::default();
        config.sit_duration = crate::types::Range::new(100.0, 100.0);
        let mut agent = agent_at(1.45, 0.0, &mut rng);
        agent.set_target(Position::new(0.0, 0.0));
        agent.update(0.1, &park, &config, &mut rng);
        assert!(agent.is_sitting());

        for _ in 0..100 {
            agent.update(0.1, &park, &config, &mut rng);
        }
        assert!(agent.is_sitting());
        assert_eq!(agent.teleports(), 0);
    }

    #[test]
    fn test_heat_sends_agent_to_shade() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut park = Park::new(30.0, 3).unwrap();
        park.set_temperature(40.0);
        park.add_element(ElementType::Tree, 2, 2);
        let config = PedestrianConfig::default();
        let mut agent = agent_at(-12.0, -12.0, &mut rng);

        let mut sought_shade = false;
        let mut rested_in_shade = false;
        for _ in 0..1000 {
            agent.update(0.1, &park, &config, &mut rng);
            sought_shade |= agent.state() == AgentState::SeekingShade;
            if agent.state() == AgentState::Resting && park.is_in_shade(&agent.position()) {
                rested_in_shade = true;
                break;
            }
        }
        assert!(sought_shade);
        assert!(rested_in_shade);
    }

    #[test]
    fn test_extreme_heat_prefers_fountain() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut park = Park::new(30.0, 3).unwrap();
        park.set_temperature(45.0);
        park.add_element(ElementType::Tree, 0, 0);
        park.add_element(ElementType::Fountain, 2, 2);
        let config = PedestrianConfig::default();
        let mut agent = agent_at(0.0, 0.0, &mut rng);
        agent.update(0.1, &park, &config, &mut rng);
        assert_eq!(agent.state(), AgentState::SeekingCoolness);
        assert_eq!(agent.target(), Some(Position::new(10.0, 10.0)));
    }

    #[test]
    fn test_extreme_heat_pulls_agent_out_of_shade() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut park = Park::new(30.0, 3).unwrap();
        park.set_temperature(45.0);
        park.add_element(ElementType::Tree, 0, 0);
        park.add_element(ElementType::Fountain, 2, 2);
        let config = PedestrianConfig::default();
        let mut agent = agent_at(-8.0, -10.0, &mut rng);
        assert!(park.is_in_shade(&agent.position()));

        agent.update(0.1, &park, &config, &mut rng);
        assert_eq!(agent.state(), AgentState::SeekingCoolness);
        assert_eq!(agent.target(), Some(Position::new(10.0, 10.0)));
    }

    #[test]
    fn test_missing_amenities_fall_back_to_wandering() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut park = Park::new(30.0, 3).unwrap();
        park.set_temperature(45.0);
        let config = PedestrianConfig::default();
        let mut agent = agent_at(0.0, 0.0, &mut rng);
        agent.state = AgentState::SeekingCoolness;
        agent.update(0.1, &park, &config, &mut rng);
        assert_eq!(agent.state(), AgentState::MovingToTarget);
    }

    #[test]
    fn test_discomfort_scales_with_tolerance() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut park = Park::new(30.0, 3).unwrap();
        park.set_temperature(33.5);
        let config = PedestrianConfig::default();
        let mut agent = agent_at(0.0, 0.0, &mut rng);
        agent.heat_tolerance = 1.0;
        agent.update_discomfort(0.5, &park, &config);
        assert!((agent.discomfort() - 0.5).abs() < 1e-12);
        assert_eq!(agent.time_in_discomfort(), 0.5);

        park.set_temperature(22.0);
        agent.update_discomfort(0.5, &park, &config);
        assert_eq!(agent.discomfort(), 0.0);
        assert_eq!(agent.time_in_discomfort(), 0.0);
    }

    #[test]
    fn test_edge_position_lies_on_square() {
        let mut rng = StdRng::seed_from_u64(14);
        for _ in 0..100 {
            let p = edge_position(13.0, &mut rng);
            assert!(p.x.abs() == 13.0 || p.y.abs() == 13.0);
            assert!(p.x.abs() <= 13.0 && p.y.abs() <= 13.0);
        }
    }
}
