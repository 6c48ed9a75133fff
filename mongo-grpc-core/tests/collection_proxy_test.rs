use mongo_grpc_core::{
    bson::{Bson, doc, oid::ObjectId},
    proto::pb::{
        bson::{self as wire, value::Kind},
        mongo::{FindRequest, InsertManyRequest, InsertOneRequest},
    },
    store::CollectionStore,
};
use support::{field, find_request, id_request, setup, string, string_field, value};
use tonic::Code;

mod support;

fn hello_world() -> wire::Document {
    wire::Document {
        id: None,
        field: vec![field("hello", string("world"))],
    }
}

#[tokio::test]
async fn test_insert_one() {
    let (mut client, store) = setup();

    let request = InsertOneRequest {
        document: Some(hello_world()),
    };

    let response = client.insert_one(request).await.unwrap().into_inner();

    assert!(response.acknowledged);
    let inserted_id = response
        .inserted_id
        .expect("Response did not include the inserted id");

    let id = ObjectId::parse_str(&inserted_id.id).unwrap();
    let stored = store
        .find_one(doc! { "_id": id })
        .await
        .unwrap()
        .expect("Couldn't find document after inserting");

    assert_eq!(stored.get_str("hello").unwrap(), "world");
}

#[tokio::test]
async fn test_insert_one_keeps_client_identifier() {
    let (mut client, store) = setup();
    let id = ObjectId::new();

    let request = InsertOneRequest {
        document: Some(wire::Document {
            id: Some(wire::ObjectId { id: id.to_hex() }),
            field: vec![field("n", value(Kind::Int(1)))],
        }),
    };

    let response = client.insert_one(request).await.unwrap().into_inner();

    assert_eq!(response.inserted_id.unwrap().id, id.to_hex());
    assert_eq!(
        store.find_one(doc! { "_id": id }).await.unwrap(),
        Some(doc! { "_id": id, "n": 1 })
    );
}

#[tokio::test]
async fn test_insert_one_without_document_is_rejected() {
    let (mut client, store) = setup();

    let status = client
        .insert_one(InsertOneRequest { document: None })
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_insert_one_with_malformed_identifier_is_rejected() {
    let (mut client, store) = setup();

    let request = InsertOneRequest {
        document: Some(wire::Document {
            id: Some(wire::ObjectId {
                id: "xyz".to_string(),
            }),
            field: vec![],
        }),
    };

    let status = client.insert_one(request).await.unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_insert_one_duplicate_key_is_reported() {
    let (mut client, _store) = setup();
    let document = wire::Document {
        id: Some(wire::ObjectId {
            id: ObjectId::new().to_hex(),
        }),
        field: vec![],
    };

    client
        .insert_one(InsertOneRequest {
            document: Some(document.clone()),
        })
        .await
        .unwrap();

    let status = client
        .insert_one(InsertOneRequest {
            document: Some(document),
        })
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::AlreadyExists);
}

#[tokio::test]
async fn test_insert_one_with_non_object_id_key_is_reported() {
    let (mut client, store) = setup();

    let request = InsertOneRequest {
        document: Some(wire::Document {
            id: None,
            field: vec![field("_id", string("custom"))],
        }),
    };

    let status = client.insert_one(request).await.unwrap_err();

    assert_eq!(status.code(), Code::Internal);
    // The write itself went through
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_insert_many() {
    let (mut client, store) = setup();

    let document = (0..50)
        .map(|n| wire::Document {
            id: None,
            field: vec![field("hello", string("world")), field("n", value(Kind::Int(n)))],
        })
        .collect();

    let response = client
        .insert_many(InsertManyRequest {
            document,
            ordered: true,
        })
        .await
        .unwrap()
        .into_inner();

    assert!(response.acknowledged);
    assert_eq!(response.inserted_id.len(), 50);
    assert_eq!(store.len().await, 50);

    for (n, inserted_id) in response.inserted_id.iter().enumerate() {
        let id = ObjectId::parse_str(&inserted_id.id).unwrap();
        let stored = store.find_one(doc! { "_id": id }).await.unwrap().unwrap();
        assert_eq!(stored.get_i32("n").unwrap(), n as i32);
    }
}

#[tokio::test]
async fn test_insert_many_rejects_the_batch_on_decode_error() {
    let (mut client, store) = setup();

    let bad = wire::Document {
        id: None,
        field: vec![field(
            "pattern",
            value(Kind::Regex(wire::Regex {
                pattern: "a".to_string(),
                options: "q".to_string(),
            })),
        )],
    };

    let status = client
        .insert_many(InsertManyRequest {
            document: vec![hello_world(), bad],
            ordered: false,
        })
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_unordered_insert_many_reports_failure_after_best_effort() {
    let (mut client, store) = setup();
    let id = wire::ObjectId {
        id: ObjectId::new().to_hex(),
    };
    let keyed = wire::Document {
        id: Some(id),
        field: vec![],
    };

    let status = client
        .insert_many(InsertManyRequest {
            document: vec![keyed.clone(), keyed, hello_world()],
            ordered: false,
        })
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::AlreadyExists);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn test_find_one() {
    let (mut client, store) = setup();
    store.insert_one(doc! {}).await.unwrap();
    let inserted = store.insert_one(doc! { "hello": "world" }).await.unwrap();
    let Bson::ObjectId(inserted) = inserted else {
        panic!("Expected an ObjectId primary key");
    };
    let id = wire::ObjectId {
        id: inserted.to_hex(),
    };

    let found = client.find_one(id_request(&id)).await.unwrap().into_inner();

    assert_eq!(found.id, Some(id));
    assert_eq!(string_field(&found, "hello"), Some("world"));
    assert!(found.field.iter().all(|f| f.key != "_id"));
}

#[tokio::test]
async fn test_find_one_not_found() {
    let (mut client, store) = setup();
    store.insert_one(doc! { "hello": "world" }).await.unwrap();

    let missing = wire::ObjectId {
        id: ObjectId::new().to_hex(),
    };
    let status = client.find_one(id_request(&missing)).await.unwrap_err();

    assert_eq!(status.code(), Code::NotFound);
}

#[tokio::test]
async fn test_find_one_by_field_and_without_query() {
    let (mut client, store) = setup();
    store
        .insert_many(vec![doc! { "k": "a" }, doc! { "k": "b" }], true)
        .await
        .unwrap();

    let found = client
        .find_one(find_request(vec![field("k", string("b"))]))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(string_field(&found, "k"), Some("b"));

    let first = client
        .find_one(FindRequest { query: None })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(string_field(&first, "k"), Some("a"));
}

#[tokio::test]
async fn test_nested_values_survive_the_proxy() {
    let (mut client, _store) = setup();

    let nested = wire::Document {
        id: None,
        field: vec![
            field("label", string("nested")),
            field(
                "payload",
                value(Kind::Object(wire::Object {
                    field: vec![
                        field("when", value(Kind::Date(wire::Date { milliseconds: 42 }))),
                        field(
                            "tags",
                            value(Kind::Array(wire::Array {
                                element: vec![string("x"), value(Kind::Long(7))],
                            })),
                        ),
                        field("blob", value(Kind::BinData(vec![1, 2, 3]))),
                    ],
                })),
            ),
        ],
    };

    client
        .insert_one(InsertOneRequest {
            document: Some(nested.clone()),
        })
        .await
        .unwrap();

    let found = client
        .find_one(find_request(vec![field("label", string("nested"))]))
        .await
        .unwrap()
        .into_inner();

    assert!(found.id.is_some());
    assert_eq!(found.field, nested.field);
}
