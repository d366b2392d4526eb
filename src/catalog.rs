//! The storefront and admin endpoints, one line per backend resource.

use std::collections::HashMap;

use axum::http::Method;

use crate::endpoint::{EndpointSpec, QueryParam};

const PAGE: QueryParam = QueryParam::with_default("page", "1");
const LIMIT: QueryParam = QueryParam::with_default("limit", "10");
const SEARCH: QueryParam = QueryParam::optional("search");
const STATUS: QueryParam = QueryParam::optional("status");
const SORT: QueryParam = QueryParam::optional("sort");

pub fn catalog() -> Vec<EndpointSpec> {
    let mut endpoints = Vec::new();
    endpoints.extend(auth());
    endpoints.extend(products());
    endpoints.extend(categories());
    endpoints.extend(cart());
    endpoints.extend(coupons());
    endpoints.extend(orders());
    endpoints.extend(users());
    endpoints.extend(chat());
    endpoints.push(
        EndpointSpec::post("contact.send", "/api/contact", "/contact")
            .public()
            .requires(&["name", "email", "message"]),
    );
    endpoints
}

/// Look up an endpoint by name.
pub fn find(name: &str) -> Option<EndpointSpec> {
    catalog().into_iter().find(|e| e.name == name)
}

/// Find the endpoint serving `method path`, with its path parameters.
/// Literal segments beat placeholders, as in the router.
pub fn resolve(method: &Method, path: &str) -> Option<(EndpointSpec, HashMap<String, String>)> {
    catalog()
        .into_iter()
        .filter(|e| e.method == *method)
        .filter_map(|e| e.match_path(path).map(|params| (e, params)))
        .min_by_key(|(_, params)| params.len())
}

fn auth() -> Vec<EndpointSpec> {
    vec![
        EndpointSpec::post("auth.login", "/api/auth/login", "/auth/login")
            .public()
            .requires(&["email", "password"]),
        EndpointSpec::post("auth.register", "/api/auth/register", "/auth/register")
            .public()
            .requires(&["name", "email", "password"]),
        EndpointSpec::post("auth.refresh", "/api/auth/refresh-token", "/auth/refresh-token")
            .body_credential("refreshToken"),
        EndpointSpec::post("auth.logout", "/api/auth/logout", "/auth/logout"),
        EndpointSpec::get("auth.me", "/api/auth/me", "/auth/me"),
        EndpointSpec::put("auth.profile", "/api/auth/profile", "/auth/profile"),
        EndpointSpec::put("auth.password", "/api/auth/change-password", "/auth/change-password")
            .requires(&["currentPassword", "newPassword"]),
        EndpointSpec::post("auth.forgot", "/api/auth/forgot-password", "/auth/forgot-password")
            .public()
            .requires(&["email"]),
        EndpointSpec::post("auth.reset", "/api/auth/reset-password", "/auth/reset-password")
            .public()
            .requires(&["token", "password"]),
    ]
}

fn products() -> Vec<EndpointSpec> {
    vec![
        EndpointSpec::get("products.list", "/api/products", "/products")
            .public()
            .query(&[
                PAGE,
                LIMIT,
                SEARCH,
                QueryParam::optional("category"),
                SORT,
                QueryParam::optional("minPrice"),
                QueryParam::optional("maxPrice"),
            ]),
        EndpointSpec::get("products.featured", "/api/products/featured", "/products/featured")
            .public()
            .query(&[QueryParam::with_default("limit", "6")]),
        EndpointSpec::get(
            "products.new_arrivals",
            "/api/products/new-arrivals",
            "/products/new-arrivals",
        )
        .public()
        .query(&[QueryParam::with_default("limit", "8")]),
        EndpointSpec::get("products.detail", "/api/products/:sku", "/products/{sku}").public(),
        EndpointSpec::get(
            "products.related",
            "/api/products/:sku/related",
            "/products/{sku}/related",
        )
        .public()
        .query(&[QueryParam::with_default("limit", "6")]),
        EndpointSpec::get(
            "products.questions",
            "/api/products/:sku/questions",
            "/products/{sku}/questions",
        )
        .public()
        .query(&[PAGE, LIMIT]),
        EndpointSpec::post(
            "products.ask",
            "/api/products/:sku/questions",
            "/products/{sku}/questions",
        )
        .requires(&["question"]),
        EndpointSpec::put(
            "admin.questions.answer",
            "/api/admin/questions/:id/answer",
            "/admin/questions/{id}/answer",
        )
        .requires(&["answer"]),
        EndpointSpec::delete(
            "admin.questions.delete",
            "/api/admin/questions/:id",
            "/admin/questions/{id}",
        ),
        EndpointSpec::get("admin.products.list", "/api/admin/products", "/admin/products")
            .query(&[PAGE, LIMIT, SEARCH, QueryParam::optional("category"), SORT]),
        EndpointSpec::post("admin.products.create", "/api/admin/products", "/admin/products")
            .multipart()
            .requires(&["name", "sku", "price"]),
        EndpointSpec::put(
            "admin.products.update",
            "/api/admin/products/:sku",
            "/admin/products/{sku}",
        )
        .multipart(),
        EndpointSpec::delete(
            "admin.products.delete",
            "/api/admin/products/:sku",
            "/admin/products/{sku}",
        ),
        EndpointSpec::get(
            "admin.dashboard",
            "/api/admin/dashboard/stats",
            "/admin/dashboard/stats",
        )
        .raw(),
    ]
}

fn categories() -> Vec<EndpointSpec> {
    vec![
        EndpointSpec::get("categories.list", "/api/categories", "/categories")
            .public()
            .raw(),
        EndpointSpec::post("admin.categories.create", "/api/admin/categories", "/admin/categories")
            .requires(&["name"]),
        EndpointSpec::put(
            "admin.categories.update",
            "/api/admin/categories/:id",
            "/admin/categories/{id}",
        ),
        EndpointSpec::delete(
            "admin.categories.delete",
            "/api/admin/categories/:id",
            "/admin/categories/{id}",
        ),
    ]
}

fn cart() -> Vec<EndpointSpec> {
    vec![
        EndpointSpec::get("cart.get", "/api/cart", "/cart"),
        EndpointSpec::post("cart.add", "/api/cart/add", "/cart/add").requires(&["sku", "quantity"]),
        EndpointSpec::put("cart.update", "/api/cart/update", "/cart/update")
            .requires(&["sku", "quantity"]),
        EndpointSpec::delete("cart.remove", "/api/cart/remove/:sku", "/cart/remove/{sku}"),
        EndpointSpec::delete("cart.clear", "/api/cart/clear", "/cart/clear"),
    ]
}

fn coupons() -> Vec<EndpointSpec> {
    vec![
        EndpointSpec::post("coupons.apply", "/api/coupons/apply", "/coupons/apply")
            .requires(&["code"]),
        EndpointSpec::get("coupons.available", "/api/coupons/available", "/coupons/available")
            .optional_auth(),
        EndpointSpec::get("admin.coupons.list", "/api/admin/coupons", "/admin/coupons")
            .query(&[PAGE, LIMIT, SEARCH, STATUS]),
        EndpointSpec::post("admin.coupons.create", "/api/admin/coupons", "/admin/coupons")
            .requires(&["code", "discount"]),
        EndpointSpec::put(
            "admin.coupons.update",
            "/api/admin/coupons/:id",
            "/admin/coupons/{id}",
        ),
        EndpointSpec::delete(
            "admin.coupons.delete",
            "/api/admin/coupons/:id",
            "/admin/coupons/{id}",
        ),
    ]
}

fn orders() -> Vec<EndpointSpec> {
    vec![
        EndpointSpec::post("orders.create", "/api/orders", "/orders")
            .requires(&["items", "shippingAddress", "paymentMethod"]),
        EndpointSpec::get("orders.mine", "/api/my-orders", "/orders/my-orders")
            .query(&[PAGE, LIMIT, STATUS]),
        EndpointSpec::get("orders.detail", "/api/orders/:id", "/orders/{id}"),
        EndpointSpec::put("orders.cancel", "/api/orders/:id/cancel", "/orders/{id}/cancel"),
        EndpointSpec::get("admin.orders.list", "/api/admin/orders", "/admin/orders").query(&[
            PAGE,
            QueryParam::with_default("limit", "50"),
            STATUS,
            SEARCH,
            SORT,
        ]),
        EndpointSpec::patch(
            "admin.orders.status",
            "/api/admin/orders/:id/status",
            "/admin/orders/{id}/status",
        )
        .requires(&["status"]),
    ]
}

fn users() -> Vec<EndpointSpec> {
    vec![
        EndpointSpec::post("users.avatar", "/api/users/avatar", "/users/avatar").multipart(),
        EndpointSpec::get("admin.users.list", "/api/admin/users", "/admin/users")
            .query(&[PAGE, LIMIT, SEARCH, QueryParam::optional("role")]),
        EndpointSpec::get("admin.users.detail", "/api/admin/users/:id", "/admin/users/{id}"),
        EndpointSpec::put("admin.users.update", "/api/admin/users/:id", "/admin/users/{id}"),
        EndpointSpec::delete("admin.users.delete", "/api/admin/users/:id", "/admin/users/{id}"),
    ]
}

fn chat() -> Vec<EndpointSpec> {
    vec![
        EndpointSpec::get(
            "chat.conversations",
            "/api/chat/conversations",
            "/chat/conversations",
        )
        .optional_auth(),
        EndpointSpec::post(
            "chat.start",
            "/api/chat/conversations",
            "/chat/conversations",
        )
        .optional_auth()
        .requires(&["message"]),
        EndpointSpec::get(
            "chat.messages",
            "/api/chat/conversations/:id/messages",
            "/chat/conversations/{id}/messages",
        )
        .optional_auth()
        .query(&[PAGE, QueryParam::with_default("limit", "50")]),
        EndpointSpec::post(
            "chat.send",
            "/api/chat/conversations/:id/messages",
            "/chat/conversations/{id}/messages",
        )
        .optional_auth()
        .requires(&["content"]),
    ]
}
