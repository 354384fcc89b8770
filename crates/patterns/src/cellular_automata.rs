//! Cellular automata — local grid rules, emergent global behaviour.
//!
//! A grid of cells (empty, resource, obstacle) and simple agents that move
//! toward nearby resources, collect them, lose energy each tick and expire
//! at zero. The world update is pure local rules with a seeded RNG; the
//! model is consulted once at the end to narrate the emergent outcome.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// What occupies a grid cell (besides agents).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Empty,
    Resource,
    Obstacle,
}

/// One grid agent.
#[derive(Debug, Clone)]
pub struct GridAgent {
    pub id: usize,
    pub x: usize,
    pub y: usize,
    pub energy: i32,
    pub collected: u32,
    pub alive: bool,
}

/// Per-tick world statistics.
#[derive(Debug, Clone)]
pub struct TickStats {
    pub tick: usize,
    pub alive_agents: usize,
    pub resources_left: usize,
    pub total_collected: u32,
}

/// The world.
pub struct World {
    width: usize,
    height: usize,
    grid: Vec<CellKind>,
    agents: Vec<GridAgent>,
    rng: StdRng,
    tick: usize,
    energy_per_resource: i32,
    energy_per_tick: i32,
}

impl World {
    /// Build a world with scattered resources and obstacles.
    pub fn new(width: usize, height: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut grid = vec![CellKind::Empty; width * height];
        for cell in grid.iter_mut() {
            let roll: f64 = rng.gen();
            *cell = if roll < 0.15 {
                CellKind::Resource
            } else if roll < 0.22 {
                CellKind::Obstacle
            } else {
                CellKind::Empty
            };
        }
        Self {
            width,
            height,
            grid,
            agents: Vec::new(),
            rng,
            tick: 0,
            energy_per_resource: 5,
            energy_per_tick: 1,
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn cell(&self, x: usize, y: usize) -> CellKind {
        self.grid[self.index(x, y)]
    }

    pub fn agents(&self) -> &[GridAgent] {
        &self.agents
    }

    /// Spawn an agent on the first free cell from a random probe.
    pub fn spawn_agent(&mut self, energy: i32) -> usize {
        let id = self.agents.len();
        let (x, y) = self.find_free_cell();
        self.agents.push(GridAgent {
            id,
            x,
            y,
            energy,
            collected: 0,
            alive: true,
        });
        id
    }

    fn find_free_cell(&mut self) -> (usize, usize) {
        for _ in 0..self.width * self.height {
            let x = self.rng.gen_range(0..self.width);
            let y = self.rng.gen_range(0..self.height);
            if self.cell(x, y) != CellKind::Obstacle {
                return (x, y);
            }
        }
        (0, 0)
    }

    /// Neighbouring coordinates within bounds (8-neighbourhood).
    fn neighbours(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let mut result = Vec::with_capacity(8);
        for dx in -1i32..=1 {
            for dy in -1i32..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx >= 0 && ny >= 0 && (nx as usize) < self.width && (ny as usize) < self.height {
                    result.push((nx as usize, ny as usize));
                }
            }
        }
        result
    }

    /// Movement rule: step onto a neighbouring resource if one exists,
    /// otherwise drift randomly, never onto obstacles.
    fn movement_target(&mut self, x: usize, y: usize) -> (usize, usize) {
        let neighbours = self.neighbours(x, y);
        if let Some(&target) = neighbours
            .iter()
            .find(|(nx, ny)| self.cell(*nx, *ny) == CellKind::Resource)
        {
            return target;
        }
        let open: Vec<(usize, usize)> = neighbours
            .into_iter()
            .filter(|(nx, ny)| self.cell(*nx, *ny) != CellKind::Obstacle)
            .collect();
        if open.is_empty() {
            (x, y)
        } else {
            open[self.rng.gen_range(0..open.len())]
        }
    }

    /// Advance the world one tick.
    pub fn update(&mut self) -> TickStats {
        self.tick += 1;

        for i in 0..self.agents.len() {
            if !self.agents[i].alive {
                continue;
            }
            let (x, y) = (self.agents[i].x, self.agents[i].y);
            let (nx, ny) = self.movement_target(x, y);
            self.agents[i].x = nx;
            self.agents[i].y = ny;

            // Resource collection
            let idx = self.index(nx, ny);
            if self.grid[idx] == CellKind::Resource {
                self.grid[idx] = CellKind::Empty;
                self.agents[i].collected += 1;
                self.agents[i].energy += self.energy_per_resource;
            }

            // Energy decay
            self.agents[i].energy -= self.energy_per_tick;
            if self.agents[i].energy <= 0 {
                debug!(agent = self.agents[i].id, "agent expired");
                self.agents[i].alive = false;
            }
        }

        self.stats()
    }

    /// Current statistics.
    pub fn stats(&self) -> TickStats {
        TickStats {
            tick: self.tick,
            alive_agents: self.agents.iter().filter(|a| a.alive).count(),
            resources_left: self
                .grid
                .iter()
                .filter(|c| **c == CellKind::Resource)
                .count(),
            total_collected: self.agents.iter().map(|a| a.collected).sum(),
        }
    }

    /// Render the grid as text (`.` empty, `*` resource, `#` obstacle,
    /// `A` agent).
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let has_agent = self
                    .agents
                    .iter()
                    .any(|a| a.alive && a.x == x && a.y == y);
                out.push(if has_agent {
                    'A'
                } else {
                    match self.cell(x, y) {
                        CellKind::Empty => '.',
                        CellKind::Resource => '*',
                        CellKind::Obstacle => '#',
                    }
                });
            }
            out.push('\n');
        }
        out
    }
}

/// Demo: run 12 ticks of a seeded world, then narrate the outcome.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let mut world = World::new(12, 8, 2024);
    for _ in 0..4 {
        world.spawn_agent(10);
    }

    let mut report = DemoReport::new("cellular-automata");
    report.push("Initial grid", world.render());

    let mut history = Vec::new();
    for _ in 0..12 {
        history.push(world.update());
    }

    report.push("Final grid", world.render());
    report.push(
        "Tick history",
        history
            .iter()
            .map(|s| {
                format!(
                    "tick {:>2}: alive {}  resources {}  collected {}",
                    s.tick, s.alive_agents, s.resources_left, s.total_collected
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    );

    let final_stats = world.stats();
    let narration = llm
        .generate(&format!(
            "A grid world simulation ran 12 ticks with 4 agents collecting \
             resources under energy decay. Final state: {} agents alive, {} \
             resources left, {} collected in total.\n\
             Describe the emergent behaviour in two sentences.",
            final_stats.alive_agents, final_stats.resources_left, final_stats.total_collected
        ))
        .await?;
    report.push("Narration", narration);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[test]
    fn world_is_deterministic_per_seed() {
        let mut a = World::new(10, 10, 7);
        let mut b = World::new(10, 10, 7);
        a.spawn_agent(10);
        b.spawn_agent(10);
        for _ in 0..5 {
            let sa = a.update();
            let sb = b.update();
            assert_eq!(sa.total_collected, sb.total_collected);
            assert_eq!(sa.resources_left, sb.resources_left);
        }
        assert_eq!(a.render(), b.render());
    }

    #[test]
    fn agents_expire_without_energy() {
        let mut world = World::new(6, 6, 3);
        world.spawn_agent(2);
        let mut last = world.stats();
        for _ in 0..20 {
            last = world.update();
            if last.alive_agents == 0 {
                break;
            }
        }
        // With only 2 energy and sparse resources the agent dies quickly.
        assert!(last.tick <= 20);
    }

    #[test]
    fn collection_removes_resources() {
        let mut world = World::new(10, 10, 11);
        world.spawn_agent(50);
        let before = world.stats().resources_left;
        for _ in 0..30 {
            world.update();
        }
        let after = world.stats();
        assert!(after.resources_left <= before);
        assert_eq!(
            before - after.resources_left,
            after.total_collected as usize
        );
    }

    #[test]
    fn render_dimensions() {
        let world = World::new(5, 3, 1);
        let rendered = world.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.chars().count() == 5));
    }

    #[tokio::test]
    async fn demo_narrates_outcome() {
        let llm = scripted(&["Agents clustered around resource pockets until energy ran out."]);
        let report = demo(&llm).await.unwrap();
        assert!(report.render().contains("Narration"));
        assert!(report.render().contains("tick 12"));
    }
}
