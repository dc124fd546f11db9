use std::collections::HashSet;

/// Append-only title and ID ledgers for one batch.
#[derive(Debug, Default)]
pub struct DedupEngine {
    seen_titles: HashSet<String>,
    seen_ids: HashSet<String>,
    accepted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdClaim {
    pub id: String,
    pub collided: bool,
}

impl DedupEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `title`; `false` means an earlier record already used it.
    pub fn claim_title(&mut self, title: &str) -> bool {
        if self.seen_titles.contains(title) {
            return false;
        }
        self.seen_titles.insert(title.to_string());
        true
    }

    /// Registers an article ID. A collision gets `_{n}` appended, where `n` is the
    /// number of articles accepted before this one.
    pub fn claim_id(&mut self, id: String) -> IdClaim {
        let sequence = self.accepted;
        self.accepted += 1;

        if !self.seen_ids.contains(&id) {
            self.seen_ids.insert(id.clone());
            return IdClaim { id, collided: false };
        }

        let mut candidate = format!("{id}_{sequence}");
        while self.seen_ids.contains(&candidate) {
            candidate = format!("{candidate}_{sequence}");
        }
        self.seen_ids.insert(candidate.clone());
        IdClaim {
            id: candidate,
            collided: true,
        }
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_title_wins() {
        let mut engine = DedupEngine::new();
        assert!(engine.claim_title("同一个标题"));
        assert!(!engine.claim_title("同一个标题"));
        assert!(engine.claim_title("另一个标题"));
    }

    #[test]
    fn colliding_id_gets_sequence_suffix() {
        let mut engine = DedupEngine::new();
        assert_eq!(engine.claim_id("a".into()), IdClaim { id: "a".into(), collided: false });
        assert_eq!(engine.claim_id("b".into()).id, "b");
        assert_eq!(engine.claim_id("a".into()), IdClaim { id: "a_2".into(), collided: true });
        assert_eq!(engine.accepted(), 3);
    }

    #[test]
    fn suffix_that_collides_again_is_extended() {
        let mut engine = DedupEngine::new();
        engine.claim_id("x".into());
        engine.claim_id("x_2".into());
        assert_eq!(engine.claim_id("x".into()).id, "x_2_2");
    }
}
