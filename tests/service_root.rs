mod common;

use common::{MockTransport, Reply};
use redfish::schemas::{TaskState, UpdateService};
use redfish::{Error, GenericResource, ServiceRoot};

const ROOT: &str = r##"{
    "@odata.id": "/redfish/v1/",
    "@odata.type": "#ServiceRoot.v1_5_0.ServiceRoot",
    "Id": "ServiceRoot-1",
    "Name": "ServiceRootOne",
    "RedfishVersion": "1.15.0",
    "UUID": "92384634-2938-2342-8820-489239905423",
    "Chassis": {"@odata.id": "/redfish/v1/Chassis"},
    "UpdateService": {"@odata.id": "/redfish/v1/UpdateService"},
    "Tasks": {"@odata.id": "/redfish/v1/TaskService"},
    "Registries": {"@odata.id": "/redfish/v1/Registries"},
    "ProtocolFeaturesSupported": {
        "ExpandQuery": {"ExpandAll": true, "Levels": true, "MaxLevels": 3},
        "FilterQuery": true,
        "SelectQuery": false,
        "MultipleHTTPRequests": true
    },
    "Links": {"Sessions": {"@odata.id": "/redfish/v1/Sessions"}}
}"##;

fn mock() -> MockTransport {
    let mock = MockTransport::new();
    mock.on("GET", "/redfish/v1/", Reply::json(200, ROOT));
    mock
}

#[test]
fn service_root_is_parsed() {
    let mock = mock();
    let root = mock.client().service_root().expect("root");

    assert_eq!(root.entity.id, "ServiceRoot-1");
    assert_eq!(root.entity.name, "ServiceRootOne");
    assert_eq!(root.chassis, "/redfish/v1/Chassis");
    assert_eq!(root.task_service, "/redfish/v1/TaskService");
    assert_eq!(root.sessions_uri(), "/redfish/v1/Sessions");
    assert_eq!(root.redfish_version, "1.15.0");

    let features = &root.protocol_features_supported;
    assert!(features.filter_query);
    assert!(!features.select_query);
    assert!(features.multiple_http_requests);
    let expand = features.expand_query.as_ref().expect("expand query");
    assert!(expand.expand_all);
    assert_eq!(expand.max_levels, Some(3));
}

#[test]
fn chassis_accessor_gets_the_advertised_link() {
    let mock = mock();
    mock.on(
        "GET",
        "/redfish/v1/Chassis",
        Reply::json(
            200,
            r#"{"Name": "Chassis Collection", "Members": [{"@odata.id": "/redfish/v1/Chassis/1U"}]}"#,
        ),
    );
    mock.on(
        "GET",
        "/redfish/v1/Chassis/1U",
        Reply::json(
            200,
            r#"{"@odata.id": "/redfish/v1/Chassis/1U", "Id": "1U", "Name": "Chassis",
                "Status": {"Health": "OK", "State": "Enabled"}}"#,
        ),
    );

    let root = mock.client().service_root().expect("root");
    let chassis = root
        .chassis::<GenericResource>()
        .expect("chassis")
        .into_result()
        .expect("complete");

    assert_eq!(chassis.len(), 1);
    assert_eq!(chassis[0].entity.id, "1U");
    assert_eq!(mock.count("GET", "/redfish/v1/Chassis"), 1);
}

#[test]
fn singleton_accessor_decodes_the_target() {
    let mock = mock();
    mock.on(
        "GET",
        "/redfish/v1/UpdateService",
        Reply::json(
            200,
            r#"{"@odata.id": "/redfish/v1/UpdateService", "Id": "UpdateService",
                "Name": "Update Service", "ServiceEnabled": true,
                "HttpPushUri": "/redfish/v1/UpdateService/update"}"#,
        )
        .header("etag", "W/\"12\""),
    );

    let root = mock.client().service_root().expect("root");
    let service: UpdateService = root
        .update_service()
        .expect("update service")
        .expect("advertised");

    assert_eq!(service.http_push_uri, "/redfish/v1/UpdateService/update");
    assert_eq!(service.service_enabled, Some(true));
    assert_eq!(service.entity.etag(), Some("W/\"12\""));
    assert!(service.entity.raw_json().is_some());
}

#[test]
fn missing_links_yield_nothing_without_requests() {
    let mock = mock();
    let root = mock.client().service_root().expect("root");

    let accounts: Option<GenericResource> = root.account_service().expect("account service");
    assert!(accounts.is_none());

    let systems = root.systems::<GenericResource>().expect("systems");
    assert!(systems.items.is_empty());
    assert!(systems.is_complete());

    let managers: Option<GenericResource> =
        root.manager_providing_service().expect("manager");
    assert!(managers.is_none());

    assert_eq!(mock.seen().len(), 1);
}

#[test]
fn service_root_get_matches_client_helper() {
    let mock = mock();
    let client = mock.client();
    let root = ServiceRoot::get(&client).expect("root");
    assert_eq!(root.entity.odata_id, "/redfish/v1/");
    assert_eq!(root.uuid, "92384634-2938-2342-8820-489239905423");
}

#[test]
fn tasks_come_from_the_task_service() {
    let mock = mock();
    mock.on(
        "GET",
        "/redfish/v1/TaskService",
        Reply::json(
            200,
            r#"{"@odata.id": "/redfish/v1/TaskService", "Id": "TaskService",
                "ServiceEnabled": true,
                "Tasks": {"@odata.id": "/redfish/v1/TaskService/Tasks"}}"#,
        ),
    );
    mock.on(
        "GET",
        "/redfish/v1/TaskService/Tasks",
        Reply::json(
            200,
            r#"{"Members": [{"@odata.id": "/redfish/v1/TaskService/Tasks/1"}],
                "Members@odata.count": 1}"#,
        ),
    );
    mock.on(
        "GET",
        "/redfish/v1/TaskService/Tasks/1",
        Reply::json(
            200,
            r#"{"@odata.id": "/redfish/v1/TaskService/Tasks/1", "Id": "1",
                "TaskState": "Completed", "PercentComplete": 100}"#,
        ),
    );

    let root = mock.client().service_root().expect("root");
    let tasks = root.tasks().expect("tasks").into_result().expect("complete");

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].entity.id, "1");
    assert_eq!(tasks[0].task_state, Some(TaskState::Completed));
}

#[test]
fn no_task_service_means_no_tasks() {
    let mock = MockTransport::new();
    mock.on("GET", "/redfish/v1/", Reply::json(200, r#"{"Id": "RootService"}"#));

    let root = mock.client().service_root().expect("root");
    assert!(root.tasks().expect("tasks").items.is_empty());
    assert_eq!(mock.seen().len(), 1);
}

const BASE_EN: &str = "/redfish/v1/Registries/Base.1.8/Base.1.8.0.json";
const BASE_JA: &str = "/redfish/v1/Registries/Base.1.8/Base.1.8.0.ja.json";

fn base_registry(language: &str, message: &str) -> String {
    format!(
        r#"{{"Id": "Base.1.8.0", "RegistryPrefix": "Base", "RegistryVersion": "1.8.0",
            "Language": "{language}",
            "Messages": {{"PropertyNotWritable": {{
                "Message": "{message}", "NumberOfArgs": 1, "ParamTypes": ["string"],
                "Severity": "Warning", "Resolution": "Remove the property from the request body."}}}}}}"#
    )
}

fn registry_mock() -> MockTransport {
    let mock = mock();
    mock.on(
        "GET",
        "/redfish/v1/Registries",
        Reply::json(
            200,
            r#"{"Members": [{"@odata.id": "/redfish/v1/Registries/Base.1.8"}]}"#,
        ),
    );
    mock.on(
        "GET",
        "/redfish/v1/Registries/Base.1.8",
        Reply::json(
            200,
            &format!(
                r#"{{"@odata.id": "/redfish/v1/Registries/Base.1.8", "Id": "Base.1.8",
                    "Registry": "Base.1.8", "Languages": ["en", "ja"],
                    "Location": [{{"Language": "en", "Uri": "{BASE_EN}"}},
                                 {{"Language": "ja", "Uri": "{BASE_JA}"}}]}}"#
            ),
        ),
    );
    mock.on(
        "GET",
        BASE_EN,
        Reply::json(200, &base_registry("en", "The property %1 is a read only property.")),
    );
    mock.on(
        "GET",
        BASE_JA,
        Reply::json(200, &base_registry("ja", "%1 is read only (ja)")),
    );
    mock
}

#[test]
fn extended_info_message_ids_resolve_in_a_language() {
    let mock = registry_mock();
    let root = mock.client().service_root().expect("root");

    let message = root
        .message_by_language("Base.1.8.PropertyNotWritable", "en")
        .expect("message");
    assert_eq!(message.message, "The property %1 is a read only property.");
    assert_eq!(message.number_of_args, 1);
    assert_eq!(message.param_types, ["string"]);
    assert_eq!(mock.count("GET", BASE_JA), 0);

    let err = root
        .message_by_language("Base.1.8.NoSuchMessage", "en")
        .expect_err("expected not found");
    assert!(matches!(err, Error::NotFound(_)));

    let err = root
        .message_by_language("Base.1.9.PropertyNotWritable", "en")
        .expect_err("expected not found");
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn registries_are_listed_and_filtered_by_language() {
    let mock = registry_mock();
    let root = mock.client().service_root().expect("root");

    let all = root.message_registries().expect("registries");
    assert_eq!(all.len(), 2);

    let japanese = root.message_registries_by_language("ja").expect("registries");
    assert_eq!(japanese.len(), 1);
    assert_eq!(japanese[0].language, "ja");

    let base = root
        .message_registry_by_language("Base.1.8", "en")
        .expect("registry");
    assert_eq!(base.registry_version, "1.8.0");
    assert_eq!(base.entity.odata_id, BASE_EN);

    let err = root
        .message_registry_by_language("Base.1.8", "de")
        .expect_err("expected not found");
    assert!(matches!(err, Error::NotFound(_)));

    let err = root
        .message_registries_by_language("  ")
        .expect_err("expected invalid argument");
    assert!(matches!(err, Error::InvalidArgument(_)));
}
