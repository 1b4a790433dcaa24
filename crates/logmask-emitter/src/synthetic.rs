//! Synthetic log content
//!
//! Pure generation, no I/O. Each message embeds a value the log group's
//! data protection policy is expected to mask, except the first, which
//! stays readable.

use rand::Rng;

const USER_ID_LEN: usize = 8;
const EMPLOYEE_ID_LEN: usize = 9;
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";

pub const EMAIL_DOMAIN: &str = "fakedomain.com";

/// Values generated for one invocation and the log lines embedding them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticEvent {
    pub user_id: String,
    pub employee_id: String,
    pub ip_address: String,
    pub messages: [String; 4],
}

/// Generate one invocation's worth of synthetic data.
///
/// Deterministic for a deterministic `rng`.
pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> SyntheticEvent {
    let user_id = random_string(rng, LOWERCASE, USER_ID_LEN);
    let employee_id = random_string(rng, DIGITS, EMPLOYEE_ID_LEN);
    let ip_address = random_ip_address(rng);

    let messages = [
        format!("Processing data for user id: {}", user_id),
        format!("User connecting from ip address: {}", ip_address),
        format!("Email address for {}: {}@{}", user_id, user_id, EMAIL_DOMAIN),
        format!("User id: {} has employee id: EmployeeId-{}", user_id, employee_id),
    ];

    SyntheticEvent {
        user_id,
        employee_id,
        ip_address,
        messages,
    }
}

fn random_string<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

fn random_ip_address<R: Rng + ?Sized>(rng: &mut R) -> String {
    let octets: [u8; 4] = rng.gen();
    octets
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(".")
}
