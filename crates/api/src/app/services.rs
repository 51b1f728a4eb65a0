use std::sync::Arc;

use sqlx::PgPool;

use tavolo_catalog::{Product, ProductDraft};
use tavolo_core::{CustomerId, ProductId};
use tavolo_customers::{Customer, CustomerDraft};
use tavolo_infra::store::{InMemoryCatalog, InMemoryDirectory, InMemoryOrders, PostgresStore};
use tavolo_infra::{CatalogStore, CustomerDirectory, OrderStore, OrderWorkflow};

/// Store handles plus the workflow built over them.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<dyn CatalogStore>,
    pub customers: Arc<dyn CustomerDirectory>,
    pub orders: Arc<dyn OrderStore>,
    pub workflow: OrderWorkflow,
}

fn from_parts(
    catalog: Arc<dyn CatalogStore>,
    customers: Arc<dyn CustomerDirectory>,
    orders: Arc<dyn OrderStore>,
) -> AppServices {
    let workflow = OrderWorkflow::new(catalog.clone(), customers.clone(), orders.clone());
    AppServices {
        catalog,
        customers,
        orders,
        workflow,
    }
}

/// Build the service graph from the environment.
///
/// `USE_PERSISTENT_STORE=true` (with `DATABASE_URL`) selects Postgres;
/// otherwise everything runs on the in-memory backend, optionally seeded
/// with demo data via `SEED_DEMO_DATA=true`.
pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORE")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set when USE_PERSISTENT_STORE=true");
        let pool = PgPool::connect(&database_url)
            .await
            .expect("failed to connect to Postgres");
        let store = PostgresStore::new(pool);
        return from_parts(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        );
    }

    let services = from_parts(
        Arc::new(InMemoryCatalog::new()),
        Arc::new(InMemoryDirectory::new()),
        Arc::new(InMemoryOrders::new()),
    );

    let seed = std::env::var("SEED_DEMO_DATA")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);
    if seed {
        seed_demo_data(&services).await;
    }

    services
}

/// Seed the launch menu and a couple of regulars (in-memory backend only;
/// a fresh store each boot keeps this idempotent).
async fn seed_demo_data(services: &AppServices) {
    let now = chrono::Utc::now();

    let menu: [(&str, u64, &str); 4] = [
        ("Pepperoni Feast", 1899, "Classic pepperoni with extra mozzarella cheese."),
        ("Veggie Lover", 1650, "Fresh mushrooms, green peppers, onions, tomatoes, and black olives."),
        ("Meat Lover", 2100, "Pepperoni, Italian sausage, ham, bacon, and seasoned pork."),
        ("Hawaiian", 1750, "Sweet pineapple and savory ham with premium cheese."),
    ];
    for (name, price, description) in menu {
        let draft = ProductDraft {
            name: name.to_string(),
            description: Some(description.to_string()),
            price,
            category: "Pizza".to_string(),
            is_available: true,
        };
        match Product::new(ProductId::new(), draft, now) {
            Ok(product) => {
                if let Err(e) = services.catalog.insert_product(&product).await {
                    tracing::warn!("failed to seed product '{name}': {e}");
                }
            }
            Err(e) => tracing::warn!("invalid seed product '{name}': {e}"),
        }
    }

    let regulars: [(&str, &str, &str, &str, &str); 2] = [
        ("Heshan Bandaranayake", "heshan@example.com", "0771234567", "123 Pizza Street", "Colombo"),
        ("Jane Cooper", "jane@example.com", "0719876543", "456 Crust Road", "Kandy"),
    ];
    for (name, email, phone, address, city) in regulars {
        let draft = CustomerDraft {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            address: address.to_string(),
            city: city.to_string(),
        };
        match Customer::new(CustomerId::new(), draft, now) {
            Ok(customer) => {
                if let Err(e) = services.customers.insert_customer(&customer).await {
                    tracing::warn!("failed to seed customer '{name}': {e}");
                }
            }
            Err(e) => tracing::warn!("invalid seed customer '{name}': {e}"),
        }
    }

    tracing::info!("demo data seeded");
}
