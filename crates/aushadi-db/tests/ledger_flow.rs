//! End-to-end flows through the sales ledger against an in-memory database:
//! commit, return, deletion, credit resolution and reporting, including the
//! stock round-trip guarantees the counter relies on.

use chrono::Utc;

use aushadi_core::insights::{DateFilter, PaymentFilter, SalesFilter};
use aushadi_core::{
    ActorContext, CoreError, DraftLine, Money, Patient, PaymentMethod, PaymentType, Role,
    SaleDraft, StockItem,
};
use aushadi_db::repository::stock::generate_stock_id;
use aushadi_db::{Database, DbConfig, LedgerError};

fn admin() -> ActorContext {
    ActorContext::new("admin-1", Role::Admin)
}

fn staff() -> ActorContext {
    ActorContext::new("staff-1", Role::Staff)
}

async fn seed_stock(db: &Database, name: &str, price_paisa: i64, quantity: i64) -> StockItem {
    let now = Utc::now();
    let item = StockItem {
        id: generate_stock_id(),
        medicine_name: name.into(),
        brand: "GPL".into(),
        expiry_date: None,
        price_per_tab: Money::from_paisa(price_paisa),
        quantity,
        stock_add_date: now,
        last_updated: now,
    };
    db.stock().insert(&item).await.unwrap();
    item
}

fn draft_for(lines: Vec<DraftLine>) -> SaleDraft {
    SaleDraft {
        patient: Patient {
            name: "Ram Thapa".into(),
            age: Some(34),
            gender: Some("M".into()),
            address: Some("Pokhara".into()),
            phone: Some("9846000001".into()),
        },
        lines,
        discount: Money::zero(),
        payment_type: PaymentType::FullyPaid,
        paid_amount: Money::zero(),
        payment_method: PaymentMethod::Offline,
    }
}

#[tokio::test]
async fn sale_then_return_then_delete_round_trip() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let ledger = db.ledger();
    let lot = seed_stock(&db, "Cetamol 500mg", 1000, 100).await;

    // --- commit: 3 tablets at NPR 10.00 each
    let sale = ledger
        .commit_sale(&staff(), &draft_for(vec![DraftLine::new(&lot.id, 3)]))
        .await
        .unwrap();
    assert_eq!(sale.total_amount.paisa(), 3000);
    assert_eq!(sale.paid_amount.paisa(), 3000);
    assert_eq!(sale.credit_amount.paisa(), 0);
    assert_eq!(
        db.stock().get_by_id(&lot.id).await.unwrap().unwrap().quantity,
        97
    );

    // --- the committed sale is findable by its bill number
    let found = ledger.resolve_one_bill(&sale.bill_number).await.unwrap();
    assert_eq!(found.id, sale.id);

    // --- return: keep 1 of the 3; two tablets go back on the shelf
    let revised = ledger
        .commit_return(
            &admin(),
            &sale.id,
            &draft_for(vec![DraftLine::new(&lot.id, 1)]),
        )
        .await
        .unwrap();
    assert_eq!(revised.total_amount.paisa(), 1000);
    assert_eq!(revised.medicines[0].quantity, 1);
    assert_eq!(
        db.stock().get_by_id(&lot.id).await.unwrap().unwrap().quantity,
        99
    );

    // --- delete: the last tablet comes back too, stock is exactly restored
    ledger.delete_bill(&admin(), &revised.id).await.unwrap();
    assert_eq!(
        db.stock().get_by_id(&lot.id).await.unwrap().unwrap().quantity,
        100
    );
    assert!(db.sales().get_by_id(&sale.id).await.unwrap().is_none());
}

#[tokio::test]
async fn return_can_drop_a_line_and_add_another() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let ledger = db.ledger();
    let cetamol = seed_stock(&db, "Cetamol 500mg", 1000, 50).await;
    let amoxi = seed_stock(&db, "Amoxicillin 250mg", 2000, 30).await;

    let sale = ledger
        .commit_sale(&staff(), &draft_for(vec![DraftLine::new(&cetamol.id, 4)]))
        .await
        .unwrap();
    assert_eq!(db.stock().get_by_id(&cetamol.id).await.unwrap().unwrap().quantity, 46);

    // drop cetamol entirely, swap in 2 amoxicillin
    let revised = ledger
        .commit_return(
            &admin(),
            &sale.id,
            &draft_for(vec![DraftLine::new(&amoxi.id, 2)]),
        )
        .await
        .unwrap();

    // dropped line restores its full quantity; the new line decrements
    assert_eq!(db.stock().get_by_id(&cetamol.id).await.unwrap().unwrap().quantity, 50);
    assert_eq!(db.stock().get_by_id(&amoxi.id).await.unwrap().unwrap().quantity, 28);

    // the new line was snapshotted from the stock row, not the caller
    assert_eq!(revised.medicines.len(), 1);
    assert_eq!(revised.medicines[0].medicine_name, "Amoxicillin 250mg");
    assert_eq!(revised.medicines[0].price_per_tab.paisa(), 2000);
    assert_eq!(revised.total_amount.paisa(), 4000);
}

#[tokio::test]
async fn partial_payment_splits_and_resolves() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let ledger = db.ledger();
    let lot = seed_stock(&db, "Cetamol 500mg", 1000, 20).await;

    let mut draft = draft_for(vec![DraftLine::new(&lot.id, 5)]);
    draft.payment_type = PaymentType::PartiallyPaid;
    draft.paid_amount = Money::from_paisa(2000);

    let sale = ledger.commit_sale(&staff(), &draft).await.unwrap();
    assert_eq!(sale.total_amount.paisa(), 5000);
    assert_eq!(sale.paid_amount.paisa(), 2000);
    assert_eq!(sale.credit_amount.paisa(), 3000);
    assert!(sale.has_partial_balance());

    let resolved = ledger.resolve_credit(&staff(), &sale.id).await.unwrap();
    assert_eq!(resolved.payment_type, PaymentType::FullyPaid);
    assert_eq!(resolved.credit_amount.paisa(), 0);
    // the historical paid figure is preserved
    assert_eq!(resolved.paid_amount.paisa(), 2000);
    assert!(resolved.credit_resolved_date.is_some());
}

#[tokio::test]
async fn overpayment_is_rejected_before_any_write() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let ledger = db.ledger();
    let lot = seed_stock(&db, "Cetamol 500mg", 1000, 20).await;

    let mut draft = draft_for(vec![DraftLine::new(&lot.id, 2)]);
    draft.payment_type = PaymentType::PartiallyPaid;
    draft.paid_amount = Money::from_paisa(9999);

    let err = ledger.commit_sale(&staff(), &draft).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Core(CoreError::OverPayment { .. })
    ));

    assert_eq!(db.stock().get_by_id(&lot.id).await.unwrap().unwrap().quantity, 20);
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn report_filters_by_day_and_payment_state() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let ledger = db.ledger();
    let lot = seed_stock(&db, "Cetamol 500mg", 1000, 100).await;

    ledger
        .commit_sale(&staff(), &draft_for(vec![DraftLine::new(&lot.id, 2)]))
        .await
        .unwrap();

    let mut credit_draft = draft_for(vec![DraftLine::new(&lot.id, 3)]);
    credit_draft.payment_type = PaymentType::Credit;
    credit_draft.patient.name = "Sita Gurung".into();
    let credit_sale = ledger.commit_sale(&staff(), &credit_draft).await.unwrap();

    // everything was committed "now", so the day window sees both
    let report = ledger
        .report(&SalesFilter {
            date: DateFilter::Day,
            ..SalesFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(report.sales.len(), 2);
    assert_eq!(report.summary.total_amount.paisa(), 2000 + 3000);
    assert_eq!(report.summary.fully_credit_amount.paisa(), 3000);

    // unresolved-credit view
    let report = ledger
        .report(&SalesFilter {
            payment: PaymentFilter::Credit,
            ..SalesFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(report.sales.len(), 1);
    assert_eq!(report.sales[0].id, credit_sale.id);

    // resolving the credit empties that view
    ledger.resolve_credit(&staff(), &credit_sale.id).await.unwrap();
    let report = ledger
        .report(&SalesFilter {
            payment: PaymentFilter::Credit,
            ..SalesFilter::default()
        })
        .await
        .unwrap();
    assert!(report.sales.is_empty());
    assert_eq!(report.summary.fully_credit_amount.paisa(), 0);

    // text search narrows by patient name
    let report = ledger
        .report(&SalesFilter {
            search: Some("sita".into()),
            ..SalesFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(report.sales.len(), 1);
    assert_eq!(report.sales[0].patient.name, "Sita Gurung");
}

#[tokio::test]
async fn bill_numbers_are_unique_per_sale() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let ledger = db.ledger();
    let lot = seed_stock(&db, "Cetamol 500mg", 1000, 100).await;

    let mut seen = std::collections::HashSet::new();
    for _ in 0..10 {
        let sale = ledger
            .commit_sale(&staff(), &draft_for(vec![DraftLine::new(&lot.id, 1)]))
            .await
            .unwrap();
        assert!(seen.insert(sale.bill_number.clone()), "duplicate bill number");
    }
}
