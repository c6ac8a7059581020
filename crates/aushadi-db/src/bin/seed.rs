//! Seeds a demo database with stock lots and a couple of committed sales.
//!
//! ## Usage
//! ```text
//! cargo run -p aushadi-db --bin seed -- [path/to/aushadi.db]
//! ```

use chrono::{Duration, Utc};
use tracing::info;
use tracing_subscriber::EnvFilter;

use aushadi_core::{
    ActorContext, DraftLine, Money, Patient, PaymentMethod, PaymentType, Role, SaleDraft,
    StockItem,
};
use aushadi_db::repository::stock::generate_stock_id;
use aushadi_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "aushadi.db".to_string());

    info!(path = %path, "Seeding demo database");
    let db = Database::new(DbConfig::new(&path)).await?;

    let now = Utc::now();
    let lots = [
        ("Cetamol 500mg", "GPL", 200, 500, 365),
        ("Amoxicillin 250mg", "NPL", 1200, 300, 240),
        ("Cetirizine 10mg", "Deurali", 300, 450, 500),
        ("ORS Jeevan Jal", "SAB", 1500, 200, 720),
        ("Ibuprofen 400mg", "Asian", 450, 600, 400),
    ];

    let mut stock_ids = Vec::new();
    for (name, brand, price_paisa, quantity, shelf_days) in lots {
        let item = StockItem {
            id: generate_stock_id(),
            medicine_name: name.to_string(),
            brand: brand.to_string(),
            expiry_date: Some(now + Duration::days(shelf_days)),
            price_per_tab: Money::from_paisa(price_paisa),
            quantity,
            stock_add_date: now,
            last_updated: now,
        };
        db.stock().insert(&item).await?;
        stock_ids.push(item.id);
    }
    info!(count = stock_ids.len(), "Stock lots seeded");

    let staff = ActorContext::new("seed-staff", Role::Staff);
    let ledger = db.ledger();

    let paid = ledger
        .commit_sale(
            &staff,
            &SaleDraft {
                patient: Patient {
                    name: "Ram Thapa".into(),
                    age: Some(34),
                    gender: Some("M".into()),
                    address: Some("Lakeside, Pokhara".into()),
                    phone: Some("9846000001".into()),
                },
                lines: vec![
                    DraftLine::new(&stock_ids[0], 10),
                    DraftLine::new(&stock_ids[2], 5),
                ],
                discount: Money::from_paisa(100),
                payment_type: PaymentType::FullyPaid,
                paid_amount: Money::zero(),
                payment_method: PaymentMethod::Offline,
            },
        )
        .await?;

    let credit = ledger
        .commit_sale(
            &staff,
            &SaleDraft {
                patient: Patient::named("Sita Gurung"),
                lines: vec![DraftLine::new(&stock_ids[1], 6)],
                discount: Money::zero(),
                payment_type: PaymentType::Credit,
                paid_amount: Money::zero(),
                payment_method: PaymentMethod::Offline,
            },
        )
        .await?;

    info!(bill = %paid.bill_number, total = %paid.total_amount, "Demo sale committed");
    info!(bill = %credit.bill_number, credit = %credit.credit_amount, "Demo credit sale committed");

    println!("{}", serde_json::to_string_pretty(&paid)?);

    Ok(())
}
