//! Distributed stop decision.
//!
//! Once per iteration every participant sends its local convergence vote to
//! the coordinator and waits for the decision. The coordinator collects one vote
//! from every participant in rank order, ORs them with its own vote and sends
//! the result back to every participant. All ranks therefore leave the
//! iteration with the same decision.
//!
//! The decision is monotonic: once a coordinator has decided to stop, it keeps
//! answering `true` even if later votes are negative.

use super::{CommError, Communicator, Message, COORDINATOR};

/// Per-rank state of the termination protocol.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TerminationCoordinator {
    decided: bool,
}

impl TerminationCoordinator {
    pub fn new() -> Self {
        TerminationCoordinator::default()
    }

    /// Whether a positive decision has been reached.
    pub fn decided(&self) -> bool {
        self.decided
    }

    /// Runs one round of the protocol and returns the global decision.
    pub fn resolve(&mut self, comm: &Communicator, local_vote: bool) -> Result<bool, CommError> {
        let decision = if comm.is_coordinator() {
            let mut any = self.decided || local_vote;
            for source in 1..comm.size() {
                // Every vote is consumed, even after the outcome is known.
                any |= comm.recv_vote(source)?;
            }
            for dest in 1..comm.size() {
                comm.send(dest, Message::Decision(any))?;
            }
            any
        } else {
            comm.send(COORDINATOR, Message::Vote(local_vote))?;
            comm.recv_decision(COORDINATOR)?
        };
        self.decided |= decision;
        Ok(self.decided)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::World;
    use std::thread;

    /// Runs one round per entry of `rounds` on every rank, where `rounds[k][r]`
    /// is rank `r`'s vote in round `k`, and returns each rank's decisions.
    fn run_rounds(rounds: &[Vec<bool>]) -> Vec<Vec<bool>> {
        let size = rounds[0].len();
        let world = World::create(size);
        thread::scope(|scope| {
            let handles: Vec<_> = world
                .into_iter()
                .map(|comm| {
                    scope.spawn(move || {
                        let mut termination = TerminationCoordinator::new();
                        rounds
                            .iter()
                            .map(|votes| termination.resolve(&comm, votes[comm.rank()]).unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
    }

    #[test]
    fn test_no_votes_means_continue() {
        let decisions = run_rounds(&[vec![false, false, false]]);
        assert_eq!(decisions, vec![vec![false]; 3]);
    }

    #[test]
    fn test_any_participant_vote_stops_everyone() {
        let decisions = run_rounds(&[vec![false, false, true, false]]);
        assert_eq!(decisions, vec![vec![true]; 4]);
    }

    #[test]
    fn test_coordinator_vote_stops_everyone() {
        let decisions = run_rounds(&[vec![true, false]]);
        assert_eq!(decisions, vec![vec![true]; 2]);
    }

    #[test]
    fn test_decision_is_monotonic() {
        let decisions = run_rounds(&[
            vec![false, false, false],
            vec![false, true, false],
            vec![false, false, false],
        ]);
        for rank_decisions in decisions {
            assert_eq!(rank_decisions, vec![false, true, true]);
        }
    }

    #[test]
    fn test_single_rank_decides_alone() {
        let world = World::create(1);
        let mut termination = TerminationCoordinator::new();
        assert!(!termination.resolve(&world[0], false).unwrap());
        assert!(termination.resolve(&world[0], true).unwrap());
        assert!(termination.resolve(&world[0], false).unwrap());
        assert!(termination.decided());
    }

    #[test]
    fn test_silent_participant_aborts_the_coordinator() {
        let mut world = World::create(2);
        let coordinator = world.remove(0);
        drop(world);
        let mut termination = TerminationCoordinator::new();
        assert_eq!(
            termination.resolve(&coordinator, false).unwrap_err(),
            CommError::Disconnected { rank: 0, peer: 1 }
        );
    }
}
