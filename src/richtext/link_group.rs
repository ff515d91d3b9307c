// Link groups
// Runs that must be activated and selected as one unit

/// Identifier of a link group, assigned to every member run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkGroupId(usize);

impl LinkGroupId {
    pub fn new(id: usize) -> Self {
        LinkGroupId(id)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Disjoint-set of link groups built during one layout pass.
///
/// Groups are only ever merged, never split, so a run's group can be
/// resolved to its representative at the end of the pass with [`find`].
///
/// [`find`]: LinkGroups::find
#[derive(Debug, Default, Clone)]
pub struct LinkGroups {
    parents: Vec<usize>,
}

impl LinkGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn new_group(&mut self) -> LinkGroupId {
        let id = self.parents.len();
        self.parents.push(id);
        LinkGroupId(id)
    }

    /// Representative of the group containing `id`.
    /// Ids unknown to this set are their own representative.
    pub fn find(&self, id: LinkGroupId) -> LinkGroupId {
        let mut current = id.0;
        while let Some(&parent) = self.parents.get(current) {
            if parent == current {
                break;
            }
            current = parent;
        }
        LinkGroupId(current)
    }

    /// Join the groups of two runs, creating a group if neither has one.
    pub fn merge(&mut self, a: Option<LinkGroupId>, b: Option<LinkGroupId>) -> LinkGroupId {
        match (a, b) {
            (None, None) => self.new_group(),
            (Some(id), None) | (None, Some(id)) => {
                let id = self.adopt(id);
                self.find(id)
            }
            (Some(a), Some(b)) => {
                let a = self.adopt(a);
                let a = self.find(a);
                let b = self.adopt(b);
                let b = self.find(b);
                // Keep the older group as representative
                let (root, child) = if a <= b { (a, b) } else { (b, a) };
                self.parents[child.0] = root.0;
                root
            }
        }
    }

    pub fn same_group(&self, a: LinkGroupId, b: LinkGroupId) -> bool {
        self.find(a) == self.find(b)
    }

    /// Make sure `id` has a slot, for ids handed in by the producer
    fn adopt(&mut self, id: LinkGroupId) -> LinkGroupId {
        while self.parents.len() <= id.0 {
            let next = self.parents.len();
            self.parents.push(next);
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_creates_group() {
        let mut groups = LinkGroups::new();
        let id = groups.merge(None, None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.find(id), id);
    }

    #[test]
    fn merge_reuses_existing_group() {
        let mut groups = LinkGroups::new();
        let first = groups.new_group();
        assert_eq!(groups.merge(Some(first), None), first);
        assert_eq!(groups.merge(None, Some(first)), first);
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn merge_joins_two_groups() {
        let mut groups = LinkGroups::new();
        let a = groups.new_group();
        let b = groups.new_group();
        let c = groups.new_group();
        let root = groups.merge(Some(b), Some(c));
        assert_eq!(root, b);
        assert!(groups.same_group(b, c));
        assert!(!groups.same_group(a, c));

        let root = groups.merge(Some(c), Some(a));
        assert_eq!(root, a);
        assert_eq!(groups.find(b), a);
        assert_eq!(groups.find(c), a);
    }

    #[test]
    fn foreign_ids_are_adopted() {
        let mut groups = LinkGroups::new();
        let foreign = LinkGroupId::new(3);
        assert_eq!(groups.find(foreign), foreign);
        let root = groups.merge(Some(foreign), None);
        assert_eq!(root, foreign);
        assert_eq!(groups.len(), 4);
    }

    #[test]
    fn merge_adopts_both_foreign_ids() {
        let mut groups = LinkGroups::new();
        let low = LinkGroupId::new(2);
        let high = LinkGroupId::new(5);
        let root = groups.merge(Some(high), Some(low));
        assert_eq!(root, low);
        assert_eq!(groups.len(), 6);
        assert!(groups.same_group(low, high));
        assert_eq!(groups.find(high), low);
    }
}
