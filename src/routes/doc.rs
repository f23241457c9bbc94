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
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        orders::{
            AdminOrderUpdateRequest, CreateOrderRequest, OrderItemRequest, OrderList,
            OrderWithItems, UpdateOrderStatusRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        stores::{CreateStoreRequest, StoreList, UpdateStoreRequest},
    },
    models::{Order, OrderItem, Product, Profile, Role, Store},
    response::{ApiResponse, Meta},
    routes::{admin, auth, health, orders, params, products, stores},
    workflow::OrderStatus,
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
        stores::list_stores,
        stores::get_store,
        stores::create_store,
        stores::update_store,
        stores::delete_store,
        stores::list_store_orders,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order_status,
        admin::list_all_orders,
        admin::update_order,
        admin::list_all_stores
    ),
    components(
        schemas(
            Role,
            Profile,
            Store,
            Product,
            Order,
            OrderItem,
            OrderStatus,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateStoreRequest,
            UpdateStoreRequest,
            StoreList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateOrderRequest,
            OrderItemRequest,
            UpdateOrderStatusRequest,
            AdminOrderUpdateRequest,
            OrderList,
            OrderWithItems,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::StoreListQuery,
            Meta,
            ApiResponse<Store>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<StoreList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Stores", description = "Store endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
