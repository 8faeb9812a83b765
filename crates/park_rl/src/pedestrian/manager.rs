//! Owns the pedestrian population and steps it every tick.

use super::agent::{edge_position, is_walkable, AgentId, AgentState, PedestrianAgent};
use crate::config::PedestrianConfig;
use crate::environment::{ElementId, Park};
use crate::types::Position;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// The pedestrian population.
///
/// Agents are only created and destroyed here. Removing an agent always
/// stands it up first so no bench is left referenced by a dropped agent.
#[derive(Debug, Clone)]
pub struct AgentManager {
    agents: Vec<PedestrianAgent>,
    config: PedestrianConfig,
    rng: StdRng,
    next_id: u64,
}

impl AgentManager {
    /// Creates an empty manager seeded from the thread RNG.
    pub fn new(config: PedestrianConfig) -> Self {
        Self::with_rng(config, StdRng::from_rng(&mut rand::rng()))
    }

    /// Creates an empty manager with a reproducible RNG.
    pub fn with_seed(config: PedestrianConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: PedestrianConfig, rng: StdRng) -> Self {
        Self {
            agents: Vec::new(),
            config,
            rng,
            next_id: 0,
        }
    }

    pub fn config(&self) -> &PedestrianConfig {
        &self.config
    }

    pub fn agents(&self) -> &[PedestrianAgent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&PedestrianAgent> {
        self.agents.iter().find(|a| a.id() == id)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Adds one agent at a random free spot, or on the park edge if no free
    /// spot turns up within the attempt budget. Never fails.
    pub fn spawn_agent(&mut self, park: &Park) -> AgentId {
        let half = (park.size() / 2.0 - self.config.spawn_margin).max(0.0);
        let mut position = None;
        for _ in 0..self.config.spawn_attempts {
            let candidate = Position::new(
                self.rng.random_range(-half..=half),
                self.rng.random_range(-half..=half),
            );
            if self.is_spawn_position_valid(park, &candidate) {
                position = Some(candidate);
                break;
            }
        }
        let position = match position {
            Some(p) => p,
            None => {
                log::debug!("No free spawn point found, spawning on the park edge");
                edge_position(park.size() / 2.0 - self.config.emergency_inset, &mut self.rng)
            }
        };

        let id = AgentId(self.next_id);
        self.next_id += 1;
        let agent = PedestrianAgent::new(id, position, &self.config, &mut self.rng);
        self.agents.push(agent);
        id
    }

    /// Removes the most recently spawned agent, standing it up first.
    pub fn despawn_agent(&mut self) -> Option<PedestrianAgent> {
        let mut agent = self.agents.pop()?;
        agent.stand_up();
        Some(agent)
    }

    /// Removes a specific agent, standing it up first.
    pub fn remove_agent(&mut self, id: AgentId) -> Option<PedestrianAgent> {
        let index = self.agents.iter().position(|a| a.id() == id)?;
        let mut agent = self.agents.remove(index);
        agent.stand_up();
        Some(agent)
    }

    /// Spawns or removes agents until exactly `count` remain.
    pub fn set_agent_count(&mut self, park: &Park, count: usize) {
        while self.agents.len() < count {
            self.spawn_agent(park);
        }
        while self.agents.len() > count {
            self.despawn_agent();
        }
    }

    pub fn clear_all_agents(&mut self) {
        while self.despawn_agent().is_some() {}
    }

    /// Replaces every agent with a freshly spawned one. Keeps the current
    /// population size unless `count` is given.
    pub fn respawn_all_agents(&mut self, park: &Park, count: Option<usize>) {
        let count = count.unwrap_or(self.agents.len());
        self.clear_all_agents();
        for _ in 0..count {
            self.spawn_agent(park);
        }
    }

    /// Advances every agent by `dt` seconds.
    pub fn update(&mut self, park: &Park, dt: f64) {
        for agent in &mut self.agents {
            agent.update(dt, park, &self.config, &mut self.rng);
        }
    }

    /// Stands up everyone seated on a bench that is being removed.
    pub fn notify_element_removed(&mut self, id: ElementId) {
        for agent in &mut self.agents {
            if agent.current_bench().is_some_and(|b| b.id == id) {
                agent.stand_up();
            }
        }
    }

    /// Agents currently seated on `bench`.
    pub fn sitting_on(&self, bench: ElementId) -> Vec<&PedestrianAgent> {
        self.agents
            .iter()
            .filter(|a| a.current_bench().is_some_and(|b| b.id == bench))
            .collect()
    }

    /// Number of agents in each state, including empty states.
    pub fn state_counts(&self) -> BTreeMap<AgentState, usize> {
        let mut counts: BTreeMap<AgentState, usize> =
            AgentState::ALL.iter().map(|s| (*s, 0)).collect();
        for agent in &self.agents {
            *counts.entry(agent.state()).or_default() += 1;
        }
        counts
    }

    fn is_spawn_position_valid(&self, park: &Park, position: &Position) -> bool {
        is_walkable(park, position, self.config.spawn_clearance)
            && self
                .agents
                .iter()
                .all(|a| a.position().distance_2d(position) >= self.config.agent_spacing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ElementType;

    fn manager() -> AgentManager {
        AgentManager::with_seed(PedestrianConfig::default(), 42)
    }

    #[test]
    fn test_spawn_respects_clearance_and_spacing() {
        let mut park = Park::new(30.0, 3).unwrap();
        park.add_element(ElementType::Fountain, 1, 1);
        let mut agents = manager();
        agents.set_agent_count(&park, 20);
        assert_eq!(agents.agent_count(), 20);

        for agent in agents.agents() {
            let p = agent.position();
            assert!(p.x.abs() <= 15.0 && p.y.abs() <= 15.0);
        }
    }

    #[test]
    fn test_set_agent_count_shrinks() {
        let park = Park::new(30.0, 3).unwrap();
        let mut agents = manager();
        agents.set_agent_count(&park, 20);
        agents.set_agent_count(&park, 5);
        assert_eq!(agents.agent_count(), 5);
        agents.set_agent_count(&park, 8);
        assert_eq!(agents.agent_count(), 8);
    }

    #[test]
    fn test_emergency_spawn_never_fails() {
        let mut park = Park::new(30.0, 3).unwrap();
        // Fountains everywhere leave no room inside the spawn margin.
        for x in 0..3 {
            for y in 0..3 {
                park.add_element(ElementType::Fountain, x, y);
            }
        }
        let mut config = PedestrianConfig::default();
        config.spawn_clearance = 20.0;
        let mut agents = AgentManager::with_seed(config, 1);
        agents.set_agent_count(&park, 10);
        assert_eq!(agents.agent_count(), 10);
        for agent in agents.agents() {
            let p = agent.position();
            assert!(p.x.abs() == 14.0 || p.y.abs() == 14.0);
        }
    }

    #[test]
    fn test_despawn_releases_bench() {
        let mut park = Park::new(30.0, 3).unwrap();
        let bench = park.add_element(ElementType::Bench, 1, 1).unwrap().id;
        let mut config = PedestrianConfig::default();
        config.bench_seek_base = 1.0;
        config.sit_duration = crate::types::Range::new(1000.0, 1000.0);
        let mut agents = AgentManager::with_seed(config, 9);
        agents.set_agent_count(&park, 6);
        for _ in 0..600 {
            agents.update(&park, 0.1);
        }
        assert!(!agents.sitting_on(bench).is_empty());

        while let Some(removed) = agents.despawn_agent() {
            assert!(removed.current_bench().is_none());
            assert!(!removed.is_sitting());
        }
        assert!(agents.sitting_on(bench).is_empty());
    }

    #[test]
    fn test_notify_element_removed() {
        let mut park = Park::new(30.0, 3).unwrap();
        let bench = park.add_element(ElementType::Bench, 1, 1).unwrap().id;
        let mut config = PedestrianConfig::default();
        config.bench_seek_base = 1.0;
        config.sit_duration = crate::types::Range::new(1000.0, 1000.0);
        let mut agents = AgentManager::with_seed(config, 10);
        agents.set_agent_count(&park, 4);
        for _ in 0..600 {
            agents.update(&park, 0.1);
        }
        assert!(!agents.sitting_on(bench).is_empty());

        park.remove_element(bench);
        agents.notify_element_removed(bench);
        assert!(agents.sitting_on(bench).is_empty());
        assert!(agents.agents().iter().all(|a| a.position().z == 0.0));
    }

    #[test]
    fn test_state_counts_cover_population() {
        let park = Park::new(30.0, 3).unwrap();
        let mut agents = manager();
        agents.set_agent_count(&park, 12);
        for _ in 0..50 {
            agents.update(&park, 0.1);
        }
        let counts = agents.state_counts();
        assert_eq!(counts.len(), AgentState::ALL.len());
        assert_eq!(counts.values().sum::<usize>(), 12);
    }

    #[test]
    fn test_respawn_keeps_count_and_renews_ids() {
        let park = Park::new(30.0, 3).unwrap();
        let mut agents = manager();
        agents.set_agent_count(&park, 3);
        let old: Vec<AgentId> = agents.agents().iter().map(|a| a.id()).collect();
        agents.respawn_all_agents(&park, None);
        assert_eq!(agents.agent_count(), 3);
        assert!(agents.agents().iter().all(|a| !old.contains(&a.id())));
        agents.respawn_all_agents(&park, Some(7));
        assert_eq!(agents.agent_count(), 7);
        agents.clear_all_agents();
        assert_eq!(agents.agent_count(), 0);
    }

    #[test]
    fn test_seeded_managers_are_reproducible() {
        let mut park = Park::new(30.0, 3).unwrap();
        park.add_element(ElementType::Tree, 0, 0);
        park.add_element(ElementType::Bench, 2, 1);
        let mut a = manager();
        let mut b = manager();
        a.set_agent_count(&park, 5);
        b.set_agent_count(&park, 5);
        for _ in 0..100 {
            a.update(&park, 0.1);
            b.update(&park, 0.1);
        }
        let pa: Vec<Position> = a.agents().iter().map(|x| x.position()).collect();
        let pb: Vec<Position> = b.agents().iter().map(|x| x.position()).collect();
        assert_eq!(pa, pb);
    }
}
