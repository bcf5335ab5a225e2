use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        bookings::BookingList,
        checkout::{CheckoutRequest, CheckoutResponse, PaymentReturnResponse},
        guides::{GuideList, SetTourGuidesRequest, TourGuidesResponse},
        tours::{CreateTourRequest, ImportRequest, ImportSummary, TourList, TourWithGuides, UpdateTourRequest},
    },
    error::FieldError,
    models::{Booking, BookingStatus, Guide, GuideAssignment, PaymentStatus, Tour, TourStatus, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, bookings, guides, health, params, payments, tours},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        tours::list_tours,
        tours::get_tour,
        tours::create_tour,
        tours::update_tour,
        tours::set_tour_guides,
        tours::remove_tour_guide,
        guides::list_guides,
        guides::get_guide,
        bookings::checkout,
        bookings::get_by_code,
        payments::payment_return,
        admin::list_bookings,
        admin::get_booking,
        admin::confirm_booking,
        admin::complete_booking,
        admin::cancel_booking,
        admin::refund_booking,
        admin::assign_guide,
        admin::delete_booking,
        admin::import_tours,
        admin::import_guides
    ),
    components(
        schemas(
            User,
            Tour,
            TourStatus,
            Guide,
            GuideAssignment,
            Booking,
            BookingStatus,
            PaymentStatus,
            FieldError,
            TourList,
            TourWithGuides,
            CreateTourRequest,
            UpdateTourRequest,
            ImportRequest,
            ImportSummary,
            GuideList,
            SetTourGuidesRequest,
            TourGuidesResponse,
            BookingList,
            CheckoutRequest,
            CheckoutResponse,
            PaymentReturnResponse,
            params::TourQuery,
            params::BookingListQuery,
            Meta,
            ApiResponse<Tour>,
            ApiResponse<TourList>,
            ApiResponse<TourWithGuides>,
            ApiResponse<GuideList>,
            ApiResponse<Booking>,
            ApiResponse<BookingList>,
            ApiResponse<CheckoutResponse>,
            ApiResponse<PaymentReturnResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Tours", description = "Tour catalog endpoints"),
        (name = "Guides", description = "Guide endpoints"),
        (name = "Bookings", description = "Checkout and booking lookup"),
        (name = "Payments", description = "Payment provider return path"),
        (name = "Admin", description = "Admin booking and catalog endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
