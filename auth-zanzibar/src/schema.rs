use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Result, ZanzibarError};
use crate::models::Relation;

/// Static relation inheritance: each relation maps to the weaker relations it
/// implies when held on the same object.
///
/// The map is immutable once built and is handed to the engine at
/// construction. Reverse lookups ("which relations imply X?") are precomputed
/// over the transitive closure, so chains deeper than one level resolve too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InheritanceMap {
    implies: BTreeMap<Relation, BTreeSet<Relation>>,
    implied_by: BTreeMap<Relation, Vec<Relation>>,
}

impl Default for InheritanceMap {
    fn default() -> Self {
        Self::standard()
    }
}

impl InheritanceMap {
    /// `owner ⊇ {editor, viewer}`, `admin ⊇ {moderator, member}`
    pub fn standard() -> Self {
        let mut implies = BTreeMap::new();
        implies.insert(
            Relation::Owner,
            BTreeSet::from([Relation::Editor, Relation::Viewer]),
        );
        implies.insert(
            Relation::Admin,
            BTreeSet::from([Relation::Moderator, Relation::Member]),
        );
        Self::from_acyclic(implies)
    }

    /// No relation implies any other
    pub fn empty() -> Self {
        Self::from_acyclic(BTreeMap::new())
    }

    /// Build a custom map, rejecting cycles (including self-implication)
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Relation, S)>,
        S: IntoIterator<Item = Relation>,
    {
        let mut implies: BTreeMap<Relation, BTreeSet<Relation>> = BTreeMap::new();
        for (relation, weaker) in entries {
            implies.entry(relation).or_default().extend(weaker);
        }

        let graph = Self::graph(&implies);
        toposort(&graph, None)
            .map_err(|cycle| ZanzibarError::CircularInheritance(cycle.node_id()))?;

        Ok(Self::from_acyclic(implies))
    }

    fn graph(implies: &BTreeMap<Relation, BTreeSet<Relation>>) -> DiGraphMap<Relation, ()> {
        let mut graph = DiGraphMap::new();
        for relation in Relation::ALL {
            graph.add_node(relation);
        }
        for (stronger, weaker) in implies {
            for implied in weaker {
                graph.add_edge(*stronger, *implied, ());
            }
        }
        graph
    }

    fn from_acyclic(implies: BTreeMap<Relation, BTreeSet<Relation>>) -> Self {
        let graph = Self::graph(&implies);

        let mut reverse: BTreeMap<Relation, BTreeSet<Relation>> = BTreeMap::new();
        for stronger in Relation::ALL {
            let mut dfs = Dfs::new(&graph, stronger);
            while let Some(reached) = dfs.next(&graph) {
                if reached != stronger {
                    reverse.entry(reached).or_default().insert(stronger);
                }
            }
        }

        let implied_by = reverse
            .into_iter()
            .map(|(weaker, stronger)| (weaker, stronger.into_iter().collect()))
            .collect();

        Self {
            implies,
            implied_by,
        }
    }

    /// Relations directly implied by holding `relation`
    pub fn implies(&self, relation: Relation) -> impl Iterator<Item = Relation> + '_ {
        self.implies
            .get(&relation)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Every relation whose holder also satisfies `relation`, in declaration order
    pub fn implied_by(&self, relation: Relation) -> &[Relation] {
        self.implied_by
            .get(&relation)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Whether holding `held` satisfies a check for `requested`
    pub fn satisfies(&self, held: Relation, requested: Relation) -> bool {
        held == requested || self.implied_by(requested).contains(&held)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_forward_sets() {
        let map = InheritanceMap::standard();
        let owner: Vec<_> = map.implies(Relation::Owner).collect();
        assert_eq!(owner, vec![Relation::Editor, Relation::Viewer]);
        let admin: Vec<_> = map.implies(Relation::Admin).collect();
        assert_eq!(admin, vec![Relation::Moderator, Relation::Member]);
        assert_eq!(map.implies(Relation::Editor).count(), 0);
        assert_eq!(map.implies(Relation::Moderator).count(), 0);
    }

    #[test]
    fn test_standard_reverse_lookup() {
        let map = InheritanceMap::standard();
        assert_eq!(map.implied_by(Relation::Viewer), &[Relation::Owner]);
        assert_eq!(map.implied_by(Relation::Editor), &[Relation::Owner]);
        assert_eq!(map.implied_by(Relation::Moderator), &[Relation::Admin]);
        assert_eq!(map.implied_by(Relation::Member), &[Relation::Admin]);
        assert!(map.implied_by(Relation::Owner).is_empty());
        assert!(map.implied_by(Relation::Admin).is_empty());
    }

    #[test]
    fn test_editor_does_not_imply_viewer_in_standard_map() {
        let map = InheritanceMap::standard();
        assert!(!map.satisfies(Relation::Editor, Relation::Viewer));
        assert!(map.satisfies(Relation::Owner, Relation::Viewer));
        assert!(!map.satisfies(Relation::Moderator, Relation::Editor));
    }

    #[test]
    fn test_multi_level_chain_resolves_transitively() {
        let map = InheritanceMap::new([
            (Relation::Owner, vec![Relation::Editor]),
            (Relation::Editor, vec![Relation::Viewer]),
        ])
        .unwrap();

        assert_eq!(
            map.implied_by(Relation::Viewer),
            &[Relation::Owner, Relation::Editor]
        );
        assert!(map.satisfies(Relation::Owner, Relation::Viewer));
    }

    #[test]
    fn test_cycle_rejected() {
        let result = InheritanceMap::new([
            (Relation::Owner, vec![Relation::Editor]),
            (Relation::Editor, vec![Relation::Owner]),
        ]);
        assert!(matches!(result, Err(ZanzibarError::CircularInheritance(_))));
    }

    #[test]
    fn test_self_implication_rejected() {
        let result = InheritanceMap::new([(Relation::Viewer, vec![Relation::Viewer])]);
        assert!(matches!(
            result,
            Err(ZanzibarError::CircularInheritance(Relation::Viewer))
        ));
    }

    #[test]
    fn test_empty_map() {
        let map = InheritanceMap::empty();
        for relation in Relation::ALL {
            assert!(map.implied_by(relation).is_empty());
        }
    }
}
