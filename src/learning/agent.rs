//! Learning agent: the per-step observe/act/learn cycle
//!
//! Glues one adapter and one brain to a world position, independent of
//! which adapter/brain pair is plugged in. The per-episode state machine
//! is just ACTIVE → DONE; once the terminal flag is set the agent stops
//! asking the world to apply anything.

use crate::grid::{AgentBody, Observation, Position, World};

use super::adapter::{Brain, EpisodeMemory, Mode, TaskAdapter};

/// Generic learning agent
pub struct LearningAgent<Ad, B>
where
    Ad: TaskAdapter,
    B: Brain<Ad::State, Ad::Action>,
{
    name: String,
    body: AgentBody,
    mode: Mode,
    adapter: Ad,
    brain: B,
    current_obs: Option<Observation>,
    state: Option<Ad::State>,
    prev_state: Option<Ad::State>,
    prev_action: Option<Ad::Action>,
    last_action: Option<Ad::Action>,
    episode: EpisodeMemory,
}

impl<Ad, B> LearningAgent<Ad, B>
where
    Ad: TaskAdapter,
    B: Brain<Ad::State, Ad::Action>,
{
    pub fn new(name: impl Into<String>, start: Position, adapter: Ad, brain: B) -> Self {
        Self {
            name: name.into(),
            body: AgentBody::new(start),
            mode: Mode::Train,
            adapter,
            brain,
            current_obs: None,
            state: None,
            prev_state: None,
            prev_action: None,
            last_action: None,
            episode: EpisodeMemory::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn body(&self) -> &AgentBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut AgentBody {
        &mut self.body
    }

    pub fn reached_goal(&self) -> bool {
        self.body.reached_goal
    }

    pub fn adapter(&self) -> &Ad {
        &self.adapter
    }

    pub fn brain(&self) -> &B {
        &self.brain
    }

    pub fn into_brain(self) -> B {
        self.brain
    }

    pub fn episode(&self) -> &EpisodeMemory {
        &self.episode
    }

    /// Consume a fresh observation: refresh the state and check termination
    ///
    /// Reaching the terminal condition twice is harmless; the flag only
    /// ever flips one way within an episode.
    pub fn observe(&mut self, obs: Observation, world: &World) {
        self.state = Some(
            self.adapter
                .build_state(self.body.position, self.last_action, &obs, world),
        );
        if self.adapter.is_terminal(self.body.reached_goal, &obs, world) {
            self.body.reached_goal = true;
        }
        self.current_obs = Some(obs);
    }

    /// Decide the next move, or `None` when no move should be applied
    ///
    /// `None` covers three cases: already terminal, never observed, or
    /// stuck with no valid action (a dead end, not an error).
    pub fn act(&mut self, world: &World) -> Option<Position> {
        if self.body.reached_goal || self.current_obs.is_none() {
            return None;
        }

        let valid = self.adapter.valid_actions(self.body.position, world);
        if valid.is_empty() {
            return None;
        }

        let state = self.state.as_ref()?;
        let action = self.brain.select_action(state, &valid, self.mode);

        self.prev_state = Some(state.clone());
        self.prev_action = Some(action);
        self.last_action = Some(action);

        Some(self.adapter.action_to_move(self.body.position, action))
    }

    /// Shaped reward for the step that just finished, computed against the
    /// stored re-observation
    pub fn step_reward(&mut self, step: usize, max_steps: usize) -> f64 {
        let (Some(obs), Some(state)) = (self.current_obs.as_ref(), self.state.as_ref()) else {
            return 0.0;
        };
        self.adapter.reward(
            &mut self.episode,
            self.body.position,
            self.prev_state.as_ref(),
            self.prev_action,
            state,
            obs,
            step,
            max_steps,
        )
    }

    /// Feed one reward back to the brain
    ///
    /// No-op until at least one `act` has recorded a previous state/action
    /// pair this episode; brains that do not learn online ignore it.
    pub fn learn(&mut self, reward: f64, world: &World) {
        let (Some(prev_state), Some(prev_action), Some(state)) = (
            self.prev_state.as_ref(),
            self.prev_action,
            self.state.as_ref(),
        ) else {
            return;
        };

        let next_valid = self.adapter.valid_actions(self.body.position, world);
        self.brain.update(
            prev_state,
            prev_action,
            reward,
            state,
            self.body.reached_goal,
            Some(&next_valid),
        );
    }

    /// Reset all per-episode state, move the agent back to `start`, and
    /// clear the brain's internal memory
    ///
    /// Must be called between episodes that reuse the same agent object;
    /// skipping it leaks the visited set and terminal flag across episodes.
    pub fn episode_reset(&mut self, start: Position) {
        self.body = AgentBody::new(start);
        self.current_obs = None;
        self.state = None;
        self.prev_state = None;
        self.prev_action = None;
        self.last_action = None;
        self.episode.clear();
        self.brain.reset();
    }
}

/// Outcome of one driven episode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeOutcome {
    pub steps: usize,
    pub total_reward: f64,
    pub reached_goal: bool,
}

/// Drive one full episode against the world
///
/// One decision step is observe → act → apply → re-observe → reward →
/// learn; the loop ends at the terminal flag or the step budget, whichever
/// comes first. Rewards are always computed (they feed episode statistics
/// and fitness scores), but only a train-mode agent learns from them.
pub fn run_episode<Ad, B>(
    agent: &mut LearningAgent<Ad, B>,
    world: &World,
    max_steps: usize,
) -> EpisodeOutcome
where
    Ad: TaskAdapter,
    B: Brain<Ad::State, Ad::Action>,
{
    let mut total_reward = 0.0;
    let mut steps = 0;

    for step in 0..max_steps {
        let obs = world.observe_for(agent.body());
        agent.observe(obs, world);

        if let Some(target) = agent.act(world) {
            world.apply(target, agent.body_mut());
        }

        let obs = world.observe_for(agent.body());
        agent.observe(obs, world);

        let reward = agent.step_reward(step, max_steps);
        if agent.mode() == Mode::Train {
            agent.learn(reward, world);
        }

        total_reward += reward;
        steps = step + 1;

        if agent.reached_goal() {
            break;
        }
    }

    EpisodeOutcome {
        steps,
        total_reward,
        reached_goal: agent.reached_goal(),
    }
}
