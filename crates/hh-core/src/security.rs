use std::collections::HashSet;

use crate::domain::UserId;

// ============== Authorization ==============

/// Users permitted to run moderation commands. Fixed at startup.
#[derive(Clone, Debug, Default)]
pub struct AllowList {
    users: HashSet<UserId>,
}

impl AllowList {
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            users: ids.into_iter().map(UserId).collect(),
        }
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.users.contains(&user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

pub fn is_authorized(user_id: Option<UserId>, allowed: &AllowList) -> bool {
    let Some(user_id) = user_id else {
        return false;
    };
    if allowed.is_empty() {
        return false;
    }
    allowed.contains(user_id)
}
