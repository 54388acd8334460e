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
        admin::{AdminDashboardStats, DashboardStats, Review, ReviewList, SalesGraph, SalesPoint},
        auth::{
            ChangePasswordRequest, ForgotPasswordRequest, RefreshTokenRequest,
            RefreshTokenResponse, ResetPasswordRequest, SigninRequest, SigninResponse,
            SignupRequest, VerifyOtpRequest, VerifyOtpResponse,
        },
        items::{AddCommentRequest, ApproveItemRequest, CreateItemRequest, ItemList, ItemRatings},
        notifications::{MarkReadRequest, MarkReadResponse, NotificationList},
        orders::{
            OrderLineRequest, OrderList, OrderWithItems, PlaceOrderRequest, ShippingAddress,
            UpdateOrderStatusRequest,
        },
    },
    models::{Comment, Item, Notification, Order, OrderItem, User},
    response::{ApiResponse, ErrorBody, Meta},
    routes::{admin, health, items, notifications as notification_routes, users},
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
        users::signup,
        users::signin,
        users::forgot_password,
        users::verify_otp,
        users::reset_password,
        users::change_password,
        users::refresh_token,
        items::create_item,
        items::list_catalog,
        items::approve_item,
        items::place_order,
        items::add_comment,
        items::get_comments,
        admin::list_all_orders,
        admin::update_order_status,
        admin::list_admin_products,
        admin::list_low_stock,
        admin::admin_dashboard_stats,
        admin::admin_sales_graph,
        admin::dashboard_stats,
        admin::sales_graph,
        admin::list_reviews,
        notification_routes::list_notifications,
        notification_routes::mark_read
    ),
    components(
        schemas(
            User,
            Item,
            Order,
            OrderItem,
            Comment,
            Notification,
            SignupRequest,
            SigninRequest,
            SigninResponse,
            ForgotPasswordRequest,
            VerifyOtpRequest,
            VerifyOtpResponse,
            ResetPasswordRequest,
            ChangePasswordRequest,
            RefreshTokenRequest,
            RefreshTokenResponse,
            CreateItemRequest,
            ApproveItemRequest,
            ItemList,
            ItemRatings,
            AddCommentRequest,
            PlaceOrderRequest,
            OrderLineRequest,
            ShippingAddress,
            UpdateOrderStatusRequest,
            OrderWithItems,
            OrderList,
            NotificationList,
            MarkReadRequest,
            MarkReadResponse,
            DashboardStats,
            AdminDashboardStats,
            SalesGraph,
            SalesPoint,
            Review,
            ReviewList,
            Meta,
            ErrorBody,
            ApiResponse<Item>,
            ApiResponse<ItemList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<NotificationList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Users", description = "Authentication lifecycle"),
        (name = "Items", description = "Catalog and approval workflow"),
        (name = "Orders", description = "Order placement"),
        (name = "Admin", description = "Dashboards and order management"),
        (name = "Notifications", description = "Persisted notifications"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
