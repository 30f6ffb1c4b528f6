//! FidoNet FQDN formatter: `p<P>.f<F>.n<N>.z<Z>.<domain>`.

use crate::domain::address::FtnAddress;
use crate::domain::config::DEFAULT_FQDN_DOMAIN;
use crate::ports::outbound::AddressFormatter;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FidonetFqdn {
    domain: String,
}

impl FidonetFqdn {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }
}

impl Default for FidonetFqdn {
    fn default() -> Self {
        Self::new(DEFAULT_FQDN_DOMAIN)
    }
}

impl AddressFormatter for FidonetFqdn {
    fn fqdn(&self, address: &FtnAddress) -> String {
        let node = format!(
            "f{}.n{}.z{}.{}",
            address.node, address.net, address.zone, self.domain
        );
        if address.is_point() {
            format!("p{}.{node}", address.point)
        } else {
            node
        }
    }
}
