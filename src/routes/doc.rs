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
        auth::{
            ForgotPasswordRequest, GateCheck, LoginRequest, LoginResponse, RegisterRequest,
            UpdateProfileRequest,
        },
        categories::{CategoryList, CategoryRequest},
        orders::{
            CartLine, CheckoutRequest, ClientTokenResponse, OrderList, OrderWithItems,
            UpdateOrderStatusRequest,
        },
        products::{CategoryProducts, ProductCount, ProductFilterRequest, ProductList},
    },
    models::{
        AccountProfile, Category, CategorySummary, Order, OrderItem, OrderStatus, PaymentRecord,
        Product, ProductSummary, Role,
    },
    response::{ApiResponse, Meta},
    routes::{auth, categories, health, orders, params, payment, products},
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
        auth::register,
        auth::login,
        auth::forgot,
        auth::user_auth,
        auth::admin_auth,
        auth::profile_update,
        orders::list_orders,
        orders::list_all_orders,
        orders::update_order_status,
        categories::create_category,
        categories::update_category,
        categories::list_categories,
        categories::single_category,
        categories::single_category_by_id,
        categories::delete_category,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::list_products,
        products::get_product,
        products::product_photo,
        products::filter_products,
        products::product_count,
        products::product_page,
        products::search_products,
        products::related_products,
        products::products_by_category,
        payment::client_token,
        payment::checkout
    ),
    components(
        schemas(
            Role,
            AccountProfile,
            Category,
            CategorySummary,
            Product,
            ProductSummary,
            Order,
            OrderItem,
            OrderStatus,
            PaymentRecord,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            ForgotPasswordRequest,
            UpdateProfileRequest,
            GateCheck,
            CategoryRequest,
            CategoryList,
            ProductList,
            ProductFilterRequest,
            ProductCount,
            CategoryProducts,
            products::ProductUpload,
            CartLine,
            CheckoutRequest,
            ClientTokenResponse,
            OrderList,
            OrderWithItems,
            UpdateOrderStatusRequest,
            params::Pagination,
            params::ProductQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<AccountProfile>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Accounts and session tokens"),
        (name = "Orders", description = "Order history and fulfilment"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Payment", description = "Braintree client token and checkout"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_versioned_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/product/braintree/payment"));
        assert!(doc.paths.paths.contains_key("/api/v1/auth/order-status/{order_id}"));
    }
}
