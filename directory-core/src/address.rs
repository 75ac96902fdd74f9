use std::net::{IpAddr, Ipv4Addr};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("invalid caller address: {0:?}")]
    Invalid(String),
    #[error("unspecified caller address: {0}")]
    Unspecified(IpAddr),
}

/// Canonical form of a caller address as stored in the registry.
///
/// IPv4-mapped IPv6 addresses are unwrapped and every loop-back address
/// (`127.0.0.0/8`, `::1`) collapses to `127.0.0.1`, so a server seen over
/// different local stacks dedups to one record.
pub fn normalize_address(address: IpAddr) -> IpAddr {
    let address = address.to_canonical();
    if address.is_loopback() {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    } else {
        address
    }
}

/// Validates a textual caller address and returns its canonical form.
pub fn parse_caller_address(raw: &str) -> Result<IpAddr, AddressError> {
    let trimmed = raw
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']');

    let address: IpAddr = trimmed
        .parse()
        .map_err(|_| AddressError::Invalid(raw.to_string()))?;

    if address.is_unspecified() {
        return Err(AddressError::Unspecified(address));
    }

    Ok(normalize_address(address))
}
