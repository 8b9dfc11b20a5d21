// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::google,

        // --- Funnel ---
        handlers::funnel::calculate,
        handlers::funnel::subscription,
        handlers::funnel::payment,
        handlers::funnel::signature,

        // --- Users ---
        handlers::profile::get_profile,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::RegisterPayload,
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::account::AccountView,

            // --- Lead ---
            models::lead::LeadStatus,
            models::lead::PaymentFrequency,
            models::lead::InsuredPerson,
            models::lead::PaymentMethodSummary,
            models::lead::PaymentInfo,
            models::lead::SignatureInfo,
            models::lead::Lead,

            // --- Funnel ---
            models::funnel::AdditionalInsuredPayload,
            models::funnel::CalculateQuotePayload,
            models::funnel::CalculateQuoteResponse,
            models::funnel::UnderwritingPayload,
            models::funnel::UnderwritingStatus,
            models::funnel::UnderwritingResponse,
            models::funnel::PaymentMethodKind,
            models::funnel::CardDataPayload,
            models::funnel::SepaDataPayload,
            models::funnel::PaymentPayload,
            models::funnel::PaymentResponse,
            models::funnel::SignaturePayload,
            models::funnel::SignatureResponse,
            models::funnel::FunnelRoute,
            models::funnel::RoutingDecision,
            models::funnel::ProfileResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Funnel", description = "Cotação, Subscrição, Pagamento e Assinatura"),
        (name = "Users", description = "Perfil e Roteamento do Cliente"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
