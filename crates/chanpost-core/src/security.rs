use crate::domain::UserId;

/// Only listed operators may drive the bot. An empty list locks everyone out.
pub fn is_authorized(user_id: Option<UserId>, allowed_users: &[i64]) -> bool {
    let Some(user_id) = user_id else {
        return false;
    };
    if allowed_users.is_empty() {
        return false;
    }
    allowed_users.contains(&user_id.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_user_is_authorized() {
        assert!(is_authorized(Some(UserId(1)), &[1, 2]));
        assert!(!is_authorized(Some(UserId(3)), &[1, 2]));
    }

    #[test]
    fn missing_user_or_empty_list_denies() {
        assert!(!is_authorized(None, &[1]));
        assert!(!is_authorized(Some(UserId(1)), &[]));
    }
}
