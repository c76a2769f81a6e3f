/// Session record key prefix
const SESSION_PREFIX: &str = "moneywise:session:";

/// Revoked authentication ticket key prefix
const REVOKED_TICKET_PREFIX: &str = "moneywise:ticket:revoked:";

pub fn session_key(session_id: &str) -> String {
    format!("{}{}", SESSION_PREFIX, session_id)
}

pub fn revoked_ticket_key(ticket_id: &str) -> String {
    format!("{}{}", REVOKED_TICKET_PREFIX, ticket_id)
}
