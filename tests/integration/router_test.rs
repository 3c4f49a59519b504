//! End-to-end requests through the router.

use super::fixture::{seeded_store, OWNER, OWNER_EMAIL, OWNER_PASSWORD};
use farm_records::app::AppContext;
use farm_records::config::AppConfig;
use farm_records::db::Value;
use farm_records::error::FarmError;
use farm_records::registry::Route;
use farm_records::router::{Request, Response, RouterActor, RouterHandle};
use farm_records::session::Credentials;
use farm_records::store::Table;
use std::sync::Arc;

async fn router() -> RouterHandle {
    let store = seeded_store().await;
    let ctx = AppContext::new(Arc::new(store), AppConfig::default());
    let (handle, _task) = RouterActor::spawn(ctx);
    handle
}

fn expect_page(response: Response) -> farm_records::paging::PageResult {
    match response {
        Response::Page(page) => page,
        other => panic!("Expected a page, got {other:?}"),
    }
}

#[tokio::test]
async fn test_sign_in_then_list_pastures() {
    let router = router().await;

    let signed_in = router
        .send(Request::SignIn(Credentials::new(OWNER_EMAIL, OWNER_PASSWORD)))
        .await
        .unwrap();
    match signed_in {
        Response::SignedIn(user) => assert_eq!(user.user_id, OWNER),
        other => panic!("Expected SignedIn, got {other:?}"),
    }

    let page = expect_page(
        router
            .send(Request::Page {
                route: Route::Pastures,
                page_number: 1,
            })
            .await
            .unwrap(),
    );

    assert_eq!(page.total_pages, 1);
    assert_eq!(page.rows.len(), 3);
    assert_eq!(page.rows[0].get("Name"), Some(&Value::from("North Field")));
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let router = router().await;

    let err = router
        .send(Request::SignIn(Credentials::new(OWNER_EMAIL, "wrong")))
        .await
        .unwrap_err();

    assert!(matches!(err, FarmError::Auth(_)));
    let err = router
        .send(Request::Page {
            route: Route::Livestock,
            page_number: 1,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, FarmError::Auth(_)));
}

#[tokio::test]
async fn test_sign_up_starts_a_session_with_no_records() {
    let router = router().await;

    let response = router
        .send(Request::SignUp {
            credentials: Credentials::new("new@farm.test", "first-calf"),
            profile: vec![("first_name".to_string(), Value::from("Robin"))],
        })
        .await
        .unwrap();
    let user = match response {
        Response::SignedIn(user) => user,
        other => panic!("Expected SignedIn, got {other:?}"),
    };
    assert_eq!(user.email, "new@farm.test");

    let page = expect_page(
        router
            .send(Request::Page {
                route: Route::Livestock,
                page_number: 1,
            })
            .await
            .unwrap(),
    );
    assert!(page.rows.is_empty());
    assert_eq!(page.total_pages, 0);

    router.send(Request::SignOut).await.unwrap();
    let again = router
        .send(Request::SignIn(Credentials::new("new@farm.test", "first-calf")))
        .await
        .unwrap();
    assert!(matches!(again, Response::SignedIn(u) if u.user_id == user.user_id));
}

#[tokio::test]
async fn test_sign_up_with_taken_email_fails() {
    let router = router().await;

    let err = router
        .send(Request::SignUp {
            credentials: Credentials::new(OWNER_EMAIL, "anything"),
            profile: Vec::new(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Authentication error: Email already registered");
}

#[tokio::test]
async fn test_inserted_record_appears_in_listing() {
    let router = router().await;
    router
        .send(Request::SignIn(Credentials::new(OWNER_EMAIL, OWNER_PASSWORD)))
        .await
        .unwrap();

    router
        .send(Request::Insert {
            table: Table::Vetvisit,
            entity: vec![
                ("visit_id".to_string(), Value::Int(9)),
                ("livestock_id".to_string(), Value::Int(6)),
                ("visit_date".to_string(), Value::from("2023-07-04")),
                ("vet_name".to_string(), Value::from("Dr. Okafor")),
            ],
        })
        .await
        .unwrap();

    let page = expect_page(
        router
            .send(Request::Page {
                route: Route::VetVisits,
                page_number: 1,
            })
            .await
            .unwrap(),
    );
    assert_eq!(page.rows.len(), 2);
    assert_eq!(page.rows[1].get("Visit Date"), Some(&Value::from("2023-07-04")));
    assert_eq!(page.rows[1].get("Cost"), Some(&Value::Null));
}
