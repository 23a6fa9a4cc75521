use rand::Rng;

use crate::bdd::Bdd;
use crate::reference::Ref;
use crate::types::Var;

impl Bdd {
    /// Returns a satisfying assignment for the BDD, if any exists.
    ///
    /// The assignment covers exactly the variables on the chosen path,
    /// ordered by variable index. Wherever both branches are satisfiable the
    /// walk picks one at random.
    ///
    /// Returns `None` if the BDD represents the constant false function.
    pub fn random_sat<R: Rng + ?Sized>(&self, node: Ref, rng: &mut R) -> Option<Vec<(Var, bool)>> {
        if self.is_zero(node) {
            return None;
        }

        let mut path = Vec::new();
        let mut current = node;

        // In a reduced BDD every non-zero node reaches `one`, so walking down
        // any non-zero branch always ends in a model.
        while !self.is_one(current) {
            let v = self.variable(current);
            let high = self.high_node(current);
            let low = self.low_node(current);

            let take_high = if self.is_zero(low) {
                true
            } else if self.is_zero(high) {
                false
            } else {
                rng.random_bool(0.5)
            };

            path.push((Var::new(v), take_high));
            current = if take_high { high } else { low };
        }

        Some(path)
    }
}
