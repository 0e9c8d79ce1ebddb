//! Certificate provisioning enrollments

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ClientResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub organization_name: String,
    pub email: String,
    pub phone: String,
    pub address_line_one: String,
    pub address_line_two: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Csr {
    pub cn: String,
    /// Country code
    pub c: String,
    /// State or province
    pub st: String,
    /// City
    pub l: String,
    pub o: String,
    pub ou: String,
    pub sans: Vec<String>,
    #[serde(rename = "preferredTrustChain")]
    pub preferred_trust_chain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientMutualAuthentication {
    pub send_ca_list_to_client: bool,
    pub ocsp_enabled: bool,
    pub set_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkConfiguration {
    pub client_mutual_authentication: Option<ClientMutualAuthentication>,
    pub disallowed_tls_versions: Vec<String>,
    pub clone_dns_names: bool,
    pub geography: String,
    pub must_have_ciphers: String,
    pub ocsp_stapling: String,
    pub preferred_ciphers: String,
    pub quic_enabled: bool,
    pub secure_network: String,
    pub sni_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Organization {
    pub name: String,
    pub phone: String,
    pub address_line_one: String,
    pub address_line_two: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PendingChange {
    /// e.g. `/cps/v2/enrollments/10/changes/22`
    pub location: String,
    pub change_type: String,
}

impl PendingChange {
    /// Last path segment of the change location
    pub fn change_id(&self) -> Option<&str> {
        self.location
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Enrollment {
    pub admin_contact: Option<Contact>,
    pub tech_contact: Option<Contact>,
    pub certificate_chain_type: String,
    pub certificate_type: String,
    pub contract_id: String,
    pub csr: Csr,
    pub enable_multi_stacked_certificates: bool,
    pub network_configuration: NetworkConfiguration,
    pub org: Option<Organization>,
    pub pending_changes: Vec<PendingChange>,
    pub ra: String,
    pub signature_algorithm: Option<String>,
    pub validation_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Challenge {
    #[serde(rename = "type")]
    pub challenge_type: String,
    pub full_path: String,
    pub response_body: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomainValidation {
    pub domain: String,
    pub validation_status: String,
    pub challenges: Vec<Challenge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DvChallenges {
    pub dv: Vec<DomainValidation>,
}

#[async_trait]
pub trait CpsApi: Send + Sync {
    async fn get_enrollment(&self, enrollment_id: i64) -> ClientResult<Enrollment>;

    async fn get_dv_challenges(
        &self,
        enrollment_id: i64,
        change_id: i64,
    ) -> ClientResult<DvChallenges>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_id_is_last_location_segment() {
        let change = PendingChange {
            location: "/cps/v2/enrollments/10/changes/22".to_string(),
            change_type: "new-certificate".to_string(),
        };
        assert_eq!(change.change_id(), Some("22"));
        assert_eq!(PendingChange::default().change_id(), None);
    }

    #[test]
    fn enrollment_tolerates_missing_fields() {
        let enrollment: Enrollment = serde_json::from_str(
            r#"{"csr":{"cn":"example.com","sans":["example.com"]},"ra":"lets-encrypt"}"#,
        )
        .unwrap();
        assert_eq!(enrollment.csr.cn, "example.com");
        assert!(enrollment.pending_changes.is_empty());
        assert!(enrollment.admin_contact.is_none());
    }
}
