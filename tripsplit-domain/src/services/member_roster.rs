use crate::model::{Member, MemberId};
use fxhash::FxHashMap;

pub const UNKNOWN_MEMBER_NAME: &str = "Unknown";

/// Resolves member ids to display names and member-list positions
pub struct MemberRoster<'a> {
    members: &'a [Member],
    // id -> index into `members`
    index: FxHashMap<&'a str, usize>,
}

impl<'a> MemberRoster<'a> {
    pub fn new(members: &'a [Member]) -> Self {
        let mut index = FxHashMap::default();
        for (position, member) in members.iter().enumerate() {
            // first occurrence wins when the list repeats an id
            index.entry(member.id.as_str()).or_insert(position);
        }
        Self { members, index }
    }

    pub fn position(&self, id: &MemberId) -> Option<usize> {
        self.index.get(id.as_str()).copied()
    }

    pub fn name_of(&self, id: &MemberId) -> Option<&'a str> {
        self.position(id)
            .map(|position| self.members[position].name.as_str())
    }

    /// Like [`Self::name_of`], degrading to [`UNKNOWN_MEMBER_NAME`].
    pub fn display_name(&self, id: &MemberId) -> &'a str {
        match self.name_of(id) {
            Some(name) => name,
            None => {
                tracing::warn!(
                    member_id = %id,
                    "Balance references a member missing from the trip roster"
                );
                UNKNOWN_MEMBER_NAME
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.members.len()
    }
}
