//! `edgeform_cps_enrollment`: certificate enrollment details
//!
//! Domain validation challenges are only available while a change is
//! pending; they are fetched for the newest pending change.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use edgeform_core::data::ResourceData;
use edgeform_core::provider::{DataSourceType, ErrorKind, ProviderError, ProviderResult};
use edgeform_core::resource::Value;
use edgeform_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use log::debug;

use crate::client::CpsApi;
use crate::client::cps::{Contact, DvChallenges, Enrollment};
use crate::remote_error;

pub const TYPE_NAME: &str = "edgeform_cps_enrollment";

const DNS_CHALLENGE: &str = "dns-01";
const HTTP_CHALLENGE: &str = "http-01";

fn contact_type() -> AttributeType {
    let s = || AttributeType::String;
    types::object_list(&[
        ("first_name", s()),
        ("last_name", s()),
        ("title", s()),
        ("organization", s()),
        ("email", s()),
        ("phone", s()),
        ("address_line_one", s()),
        ("address_line_two", s()),
        ("city", s()),
        ("region", s()),
        ("postal_code", s()),
        ("country_code", s()),
    ])
}

fn challenge_type() -> AttributeType {
    types::object_list(&[
        ("domain", AttributeType::String),
        ("full_path", AttributeType::String),
        ("response_body", AttributeType::String),
    ])
}

pub fn schema() -> ResourceSchema {
    let s = || AttributeType::String;
    let b = || AttributeType::Bool;
    let computed = |name: &str, t: AttributeType| AttributeSchema::new(name, t).computed();

    ResourceSchema::new(TYPE_NAME)
        .with_description("Get an enrollment for given enrollment ID")
        .attribute(
            AttributeSchema::new("enrollment_id", types::positive_int())
                .required()
                .with_description("The unique identifier of enrollment"),
        )
        .attribute(computed("common_name", s()))
        .attribute(computed("sans", types::string_list()))
        .attribute(computed("secure_network", s()))
        .attribute(computed("sni_only", b()))
        .attribute(computed("admin_contact", contact_type()))
        .attribute(computed("tech_contact", contact_type()))
        .attribute(computed("certificate_chain_type", s()))
        .attribute(computed(
            "csr",
            types::object_list(&[
                ("country_code", s()),
                ("city", s()),
                ("organization", s()),
                ("organizational_unit", s()),
                ("preferred_trust_chain", s()),
                ("state", s()),
            ]),
        ))
        .attribute(computed("enable_multi_stacked_certificates", b()))
        .attribute(computed(
            "network_configuration",
            types::object_list(&[
                (
                    "client_mutual_authentication",
                    types::object_list(&[
                        ("send_ca_list_to_client", b()),
                        ("ocsp_enabled", b()),
                        ("set_id", s()),
                    ]),
                ),
                ("disallowed_tls_versions", types::string_list()),
                ("clone_dns_names", b()),
                ("geography", s()),
                ("must_have_ciphers", s()),
                ("ocsp_stapling", s()),
                ("preferred_ciphers", s()),
                ("quic_enabled", b()),
            ]),
        ))
        .attribute(computed("signature_algorithm", s()))
        .attribute(computed(
            "organization",
            types::object_list(&[
                ("name", s()),
                ("phone", s()),
                ("address_line_one", s()),
                ("address_line_two", s()),
                ("city", s()),
                ("region", s()),
                ("postal_code", s()),
                ("country_code", s()),
            ]),
        ))
        .attribute(computed("contract_id", s()))
        .attribute(computed("certificate_type", s()))
        .attribute(computed("validation_type", s()))
        .attribute(computed("registration_authority", s()))
        .attribute(computed(
            "pending_changes",
            types::object_list(&[("location", s()), ("change_type", s())]),
        ))
        .attribute(computed("dns_challenges", challenge_type()))
        .attribute(computed("http_challenges", challenge_type()))
}

fn object<const N: usize>(fields: [(&str, Value); N]) -> Value {
    Value::Map(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

fn text(s: &str) -> Value {
    Value::String(s.to_string())
}

fn contacts(contact: Option<&Contact>) -> Value {
    Value::List(
        contact
            .map(|c| {
                object([
                    ("first_name", text(&c.first_name)),
                    ("last_name", text(&c.last_name)),
                    ("title", text(&c.title)),
                    ("organization", text(&c.organization_name)),
                    ("email", text(&c.email)),
                    ("phone", text(&c.phone)),
                    ("address_line_one", text(&c.address_line_one)),
                    ("address_line_two", text(&c.address_line_two)),
                    ("city", text(&c.city)),
                    ("region", text(&c.region)),
                    ("postal_code", text(&c.postal_code)),
                    ("country_code", text(&c.country)),
                ])
            })
            .into_iter()
            .collect(),
    )
}

/// Attribute values of everything but the challenges
fn enrollment_values(enrollment_id: i64, e: &Enrollment) -> HashMap<String, Value> {
    let network = &e.network_configuration;
    let mutual_auth = network
        .client_mutual_authentication
        .iter()
        .map(|m| {
            object([
                ("send_ca_list_to_client", Value::Bool(m.send_ca_list_to_client)),
                ("ocsp_enabled", Value::Bool(m.ocsp_enabled)),
                ("set_id", text(&m.set_id)),
            ])
        })
        .collect();

    let mut values = HashMap::from([
        ("enrollment_id".to_string(), Value::Int(enrollment_id)),
        ("common_name".to_string(), text(&e.csr.cn)),
        ("sans".to_string(), Value::from(e.csr.sans.clone())),
        ("secure_network".to_string(), text(&network.secure_network)),
        ("sni_only".to_string(), Value::Bool(network.sni_only)),
        ("admin_contact".to_string(), contacts(e.admin_contact.as_ref())),
        ("tech_contact".to_string(), contacts(e.tech_contact.as_ref())),
        (
            "certificate_chain_type".to_string(),
            text(&e.certificate_chain_type),
        ),
        (
            "csr".to_string(),
            Value::List(vec![object([
                ("country_code", text(&e.csr.c)),
                ("city", text(&e.csr.l)),
                ("organization", text(&e.csr.o)),
                ("organizational_unit", text(&e.csr.ou)),
                ("preferred_trust_chain", text(&e.csr.preferred_trust_chain)),
                ("state", text(&e.csr.st)),
            ])]),
        ),
        (
            "enable_multi_stacked_certificates".to_string(),
            Value::Bool(e.enable_multi_stacked_certificates),
        ),
        (
            "network_configuration".to_string(),
            Value::List(vec![object([
                ("client_mutual_authentication", Value::List(mutual_auth)),
                (
                    "disallowed_tls_versions",
                    Value::from(network.disallowed_tls_versions.clone()),
                ),
                ("clone_dns_names", Value::Bool(network.clone_dns_names)),
                ("geography", text(&network.geography)),
                ("must_have_ciphers", text(&network.must_have_ciphers)),
                ("ocsp_stapling", text(&network.ocsp_stapling)),
                ("preferred_ciphers", text(&network.preferred_ciphers)),
                ("quic_enabled", Value::Bool(network.quic_enabled)),
            ])]),
        ),
        (
            "organization".to_string(),
            Value::List(
                e.org
                    .iter()
                    .map(|o| {
                        object([
                            ("name", text(&o.name)),
                            ("phone", text(&o.phone)),
                            ("address_line_one", text(&o.address_line_one)),
                            ("address_line_two", text(&o.address_line_two)),
                            ("city", text(&o.city)),
                            ("region", text(&o.region)),
                            ("postal_code", text(&o.postal_code)),
                            ("country_code", text(&o.country)),
                        ])
                    })
                    .collect(),
            ),
        ),
        ("certificate_type".to_string(), text(&e.certificate_type)),
        ("validation_type".to_string(), text(&e.validation_type)),
        ("registration_authority".to_string(), text(&e.ra)),
        (
            "pending_changes".to_string(),
            Value::List(
                e.pending_changes
                    .iter()
                    .map(|c| {
                        object([
                            ("location", text(&c.location)),
                            ("change_type", text(&c.change_type)),
                        ])
                    })
                    .collect(),
            ),
        ),
    ]);
    if let Some(algorithm) = &e.signature_algorithm {
        values.insert("signature_algorithm".to_string(), text(algorithm));
    }
    if !e.contract_id.is_empty() {
        values.insert("contract_id".to_string(), text(&e.contract_id));
    }
    values
}

/// Split challenges into (dns, http) attribute lists
fn challenge_values(challenges: &DvChallenges) -> (Vec<Value>, Vec<Value>) {
    let mut dns = Vec::new();
    let mut http = Vec::new();
    for dv in &challenges.dv {
        for challenge in &dv.challenges {
            let entry = object([
                ("domain", text(&dv.domain)),
                ("full_path", text(&challenge.full_path)),
                ("response_body", text(&challenge.response_body)),
            ]);
            match challenge.challenge_type.as_str() {
                DNS_CHALLENGE => dns.push(entry),
                HTTP_CHALLENGE => http.push(entry),
                _ => {}
            }
        }
    }
    (dns, http)
}

pub struct EnrollmentDataSource {
    client: Arc<dyn CpsApi>,
}

impl EnrollmentDataSource {
    pub fn new(client: Arc<dyn CpsApi>) -> Self {
        Self { client }
    }

    async fn challenges(
        &self,
        enrollment_id: i64,
        enrollment: &Enrollment,
    ) -> ProviderResult<(Vec<Value>, Vec<Value>)> {
        let Some(change) = enrollment.pending_changes.last() else {
            return Ok((Vec::new(), Vec::new()));
        };
        let change_id = change
            .change_id()
            .and_then(|id| id.parse::<i64>().ok())
            .ok_or_else(|| {
                ProviderError::new(
                    ErrorKind::RemoteApi,
                    format!("invalid pending change location '{}'", change.location),
                )
            })?;

        debug!(
            "fetching DV challenges of enrollment {} change {}",
            enrollment_id, change_id
        );
        let challenges = self
            .client
            .get_dv_challenges(enrollment_id, change_id)
            .await
            .map_err(remote_error("get_dv_challenges"))?;
        Ok(challenge_values(&challenges))
    }
}

#[async_trait]
impl DataSourceType for EnrollmentDataSource {
    fn name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }

    async fn read(&self, data: &mut ResourceData) -> ProviderResult<()> {
        debug!("in {}.read", TYPE_NAME);
        let enrollment_id = data.get_int("enrollment_id")?;
        let enrollment = self
            .client
            .get_enrollment(enrollment_id)
            .await
            .map_err(remote_error("get_enrollment"))?;

        let mut values = enrollment_values(enrollment_id, &enrollment);
        let (dns, http) = self.challenges(enrollment_id, &enrollment).await?;
        values.insert("dns_challenges".to_string(), Value::List(dns));
        values.insert("http_challenges".to_string(), Value::List(http));

        data.set_all(values)?;
        data.set_id(enrollment_id.to_string());
        Ok(())
    }
}
