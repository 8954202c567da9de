use std::collections::VecDeque;

use pose_control::GoalPose;
use tracing::info;

/// Goals waiting to be handed to the controller, in visiting order.
#[derive(Debug, Default)]
pub struct GoalQueue {
    queue: VecDeque<GoalPose>,
}

impl GoalQueue {
    pub fn from_goals(goals: impl IntoIterator<Item = GoalPose>) -> Self {
        Self {
            queue: goals.into_iter().collect(),
        }
    }

    /// Adds a goal to the back of the queue.
    pub fn push(&mut self, goal: GoalPose) {
        self.queue.push_back(goal);
    }

    /// Retrieves and removes the next goal from the front of the queue.
    pub fn next_goal(&mut self) -> Option<GoalPose> {
        let goal = self.queue.pop_front();
        if let Some(g) = &goal {
            info!(remaining = self.queue.len(), "Goal retrieved from queue: {}", g);
        }
        goal
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
