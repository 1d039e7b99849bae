use dns_manager::domain::{
    BindOptions, Cidr, PtrRecord, PtrZoneConfig, Record, ZoneConfig, ZoneName,
};
use dns_manager::infrastructure::config::{RecordEntry, ZoneFile};
use dns_manager::{BindServer, CommandOutput, DeleteOutcome, DnsConfigError, MemoryHost};

const NAMED_CONF: &str = "/etc/named.conf";
const REGISTRY: &str = "/etc/named.dnsmgr.zones";

fn configured_server() -> BindServer<MemoryHost> {
    let server = BindServer::new(MemoryHost::new());
    server
        .configure(BindOptions::new(vec!["8.8.8.8".parse().unwrap()]))
        .unwrap();
    server.host().clear_commands();
    server
}

fn zone(name: &str) -> ZoneName {
    ZoneName::new(name).unwrap()
}

#[test]
fn configure_writes_named_conf_and_registry() {
    let server = BindServer::new(MemoryHost::new());
    server
        .configure(BindOptions::new(vec![
            "8.8.8.8".parse().unwrap(),
            "1.1.1.1".parse().unwrap(),
        ]))
        .unwrap();

    let host = server.host();
    let named_conf = host.file(NAMED_CONF).unwrap();
    assert!(named_conf.contains("forwarders { 8.8.8.8; 1.1.1.1; };"));
    assert!(named_conf.contains("forward only;"));
    assert!(named_conf.contains("include \"/etc/named.dnsmgr.zones\";"));
    assert!(host.file(REGISTRY).is_some());

    assert!(host.ran("named-checkconf /etc/named.conf.dnsmgr-new"));
    assert!(host.ran("chown root:named /etc/named.conf"));
    assert!(host.ran("systemctl restart named"));
    assert!(host.ran("systemctl is-active named"));
    assert!(host.file("/etc/named.conf.dnsmgr-new").is_none());
}

#[test]
fn rejected_configure_leaves_host_untouched() {
    let host = MemoryHost::new();
    host.respond(
        "named-checkconf",
        CommandOutput::failed(1, "/etc/named.conf.dnsmgr-new:12: unknown option 'forwarders'"),
    );
    let server = BindServer::new(host);

    let result = server.configure(BindOptions::new(vec!["8.8.8.8".parse().unwrap()]));

    assert!(matches!(result, Err(DnsConfigError::Validation(_))));
    assert!(server.host().files().is_empty());
    assert!(!server.host().ran("systemctl restart"));
}

#[test]
fn reconfigure_failure_keeps_existing_registry() {
    let server = configured_server();
    let name = zone("example.com");
    server
        .add_zone(&name, ZoneConfig::master(Vec::new()).with_serial(1))
        .unwrap();
    let before = server.host().files();
    server
        .host()
        .respond("named-checkconf", CommandOutput::failed(1, "syntax error"));

    let result = server.configure(BindOptions::new(vec!["1.1.1.1".parse().unwrap()]));

    assert!(result.is_err());
    assert_eq!(server.host().files(), before);
    assert_eq!(server.list_zones().unwrap().len(), 1);
}

#[test]
fn configure_installs_bind_when_missing() {
    let host = MemoryHost::new();
    host.respond("rpm -q", CommandOutput::failed(1, "package bind is not installed"));
    let server = BindServer::new(host);

    server
        .configure(BindOptions::new(vec!["8.8.8.8".parse().unwrap()]))
        .unwrap();

    let commands = server.host().commands();
    let yum = commands
        .iter()
        .position(|c| c == "yum -y install bind bind-utils")
        .unwrap();
    let enable = commands
        .iter()
        .position(|c| c == "systemctl enable named")
        .unwrap();
    assert!(yum < enable);
}

#[test]
fn configure_rejects_empty_forwarders_without_remote_calls() {
    let server = BindServer::new(MemoryHost::new());
    let result = server.configure(BindOptions::new(Vec::new()));

    assert!(matches!(result, Err(DnsConfigError::Options(_))));
    assert!(server.host().commands().is_empty());
}

#[test]
fn added_zone_reads_back_with_apex_record() {
    let server = configured_server();
    let config = ZoneConfig::master(vec![Record::parse("@ A 192.168.1.10").unwrap()]);

    server.add_zone(&zone("example.com"), config).unwrap();

    let text = server.host().file("/var/named/db.example.com").unwrap();
    let apex = text
        .lines()
        .find(|line| line.starts_with('@') && line.contains(" A "))
        .unwrap();
    assert!(apex.ends_with("192.168.1.10"));

    let zones = server.list_zones().unwrap();
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0].name.as_str(), "example.com");
    assert_eq!(zones[0].file, "db.example.com");
}

#[test]
fn same_config_renders_same_file() {
    let server = configured_server();
    let config = ZoneConfig::master(vec![
        Record::parse("www A 192.168.1.10").unwrap(),
        Record::parse("ftp CNAME www").unwrap(),
    ])
    .with_serial(2024060101);

    server.add_zone(&zone("example.com"), config.clone()).unwrap();
    let first = server.host().file("/var/named/db.example.com").unwrap();
    server.add_zone(&zone("example.com"), config).unwrap();
    let second = server.host().file("/var/named/db.example.com").unwrap();

    assert_eq!(first, second);
    assert_eq!(server.list_zones().unwrap().len(), 1);
}

#[test]
fn delete_after_add_leaves_no_reference() {
    let server = configured_server();
    let name = zone("example.com");
    server
        .add_zone(
            &name,
            ZoneConfig::master(vec![Record::parse("@ A 192.168.1.10").unwrap()]),
        )
        .unwrap();

    let outcome = server.delete_zone(&name).unwrap();

    assert_eq!(outcome, DeleteOutcome::Removed);
    let host = server.host();
    assert!(host.file("/var/named/db.example.com").is_none());
    assert!(!host.file(REGISTRY).unwrap().contains("example.com"));
    assert!(!host.file(NAMED_CONF).unwrap().contains("example.com"));
    assert!(server.list_zones().unwrap().is_empty());
}

#[test]
fn deleting_missing_zone_is_a_no_op() {
    let server = configured_server();
    let before = server.host().files();

    let outcome = server.delete_zone(&zone("nothing.example")).unwrap();

    assert_eq!(outcome, DeleteOutcome::NotPresent);
    assert_eq!(server.host().files(), before);
    assert!(!server.host().ran("systemctl restart"));
}

#[test]
fn invalid_record_fails_before_touching_host() {
    let server = configured_server();
    let before = server.host().files();

    let file = ZoneFile {
        records: vec![RecordEntry {
            name: "www".into(),
            record_type: "CNAME".into(),
            value: "bad host!".into(),
        }],
        ..Default::default()
    };
    let result = ZoneConfig::try_from(file)
        .and_then(|config| server.add_zone(&zone("example.com"), config));

    assert!(matches!(result, Err(DnsConfigError::Record(_))));
    assert_eq!(server.host().files(), before);
}

#[test]
fn cname_conflict_is_rejected() {
    let server = configured_server();
    let before = server.host().files();

    let config = ZoneConfig::master(vec![
        Record::parse("www A 192.168.1.10").unwrap(),
        Record::parse("www CNAME example.com").unwrap(),
    ]);
    let result = server.add_zone(&zone("example.com"), config);

    assert!(matches!(result, Err(DnsConfigError::ZoneConfig(_))));
    assert_eq!(server.host().files(), before);
    assert!(server.host().commands().is_empty());
}

#[test]
fn checkzone_failure_aborts_before_reload() {
    let server = configured_server();
    let before = server.host().files();
    server.host().respond(
        "named-checkzone",
        CommandOutput::failed(1, "dns_rdata_fromtext: near eol: unexpected end of input"),
    );

    let result = server.add_zone(
        &zone("example.com"),
        ZoneConfig::master(vec![Record::parse("@ A 192.168.1.10").unwrap()]),
    );

    let err = result.unwrap_err();
    assert!(matches!(err, DnsConfigError::Validation(_)));
    assert!(err.to_string().contains("unexpected end of input"));
    assert_eq!(server.host().files(), before);
    assert!(!server.host().ran("systemctl restart"));
}

#[test]
fn restart_failure_restores_previous_files() {
    let server = configured_server();
    let name = zone("example.com");
    server
        .add_zone(
            &name,
            ZoneConfig::master(vec![Record::parse("@ A 192.168.1.10").unwrap()]),
        )
        .unwrap();
    let zone_before = server.host().file("/var/named/db.example.com");
    let registry_before = server.host().file(REGISTRY);

    server.host().respond(
        "systemctl restart",
        CommandOutput::failed(1, "Job for named.service failed"),
    );
    let result = server.add_zone(
        &name,
        ZoneConfig::master(vec![Record::parse("@ A 10.0.0.1").unwrap()]),
    );

    assert!(matches!(result, Err(DnsConfigError::Service(_))));
    assert_eq!(server.host().file("/var/named/db.example.com"), zone_before);
    assert_eq!(server.host().file(REGISTRY), registry_before);
}

#[test]
fn rejected_registry_keeps_deleted_zone() {
    let server = configured_server();
    let name = zone("example.com");
    server
        .add_zone(
            &name,
            ZoneConfig::master(vec![Record::parse("@ A 192.168.1.10").unwrap()]),
        )
        .unwrap();
    let before = server.host().files();
    server.host().clear_commands();
    server.host().respond(
        "named-checkconf /etc/named.dnsmgr.zones.dnsmgr-new",
        CommandOutput::failed(1, "/etc/named.dnsmgr.zones.dnsmgr-new:3: missing ';'"),
    );

    let result = server.delete_zone(&name);

    assert!(matches!(result, Err(DnsConfigError::Validation(_))));
    assert_eq!(server.host().files(), before);
    assert!(!server.host().ran("systemctl restart"));
}

#[test]
fn restart_failure_during_delete_restores_zone_and_stanza() {
    let server = configured_server();
    let name = zone("example.com");
    server
        .add_zone(
            &name,
            ZoneConfig::master(vec![Record::parse("@ A 192.168.1.10").unwrap()]),
        )
        .unwrap();
    let zone_before = server.host().file("/var/named/db.example.com");
    let registry_before = server.host().file(REGISTRY);

    server.host().respond(
        "systemctl restart",
        CommandOutput::failed(1, "Job for named.service failed"),
    );
    let result = server.delete_zone(&name);

    assert!(matches!(result, Err(DnsConfigError::Service(_))));
    assert!(zone_before.is_some());
    assert_eq!(server.host().file("/var/named/db.example.com"), zone_before);
    assert_eq!(server.host().file(REGISTRY), registry_before);
    assert!(registry_before.unwrap().contains("zone \"example.com\""));
}

#[test]
fn failed_ownership_change_leaves_no_staged_files() {
    let server = configured_server();
    let registry_before = server.host().file(REGISTRY);
    server
        .host()
        .respond("chown", CommandOutput::failed(1, "chown: invalid group"));

    let result = server.add_zone(
        &zone("example.com"),
        ZoneConfig::master(vec![Record::parse("@ A 192.168.1.10").unwrap()]),
    );

    assert!(result.is_err());
    let files = server.host().files();
    assert!(files.keys().all(|path| !path.ends_with(".dnsmgr-new")));
    assert!(server.host().file("/var/named/db.example.com").is_none());
    assert_eq!(server.host().file(REGISTRY), registry_before);
}

#[test]
fn inactive_service_after_new_zone_removes_it_again() {
    let server = configured_server();
    server.host().respond(
        "systemctl is-active",
        CommandOutput {
            status: Some(3),
            stdout: "failed\n".into(),
            stderr: String::new(),
        },
    );

    let result = server.add_zone(
        &zone("example.com"),
        ZoneConfig::master(vec![Record::parse("@ A 192.168.1.10").unwrap()]),
    );

    assert!(result.is_err());
    assert!(server.host().file("/var/named/db.example.com").is_none());
    assert!(!server.host().file(REGISTRY).unwrap().contains("example.com"));
}

#[test]
fn add_zone_requires_configure() {
    let server = BindServer::new(
        MemoryHost::new().with_file(NAMED_CONF, "options { directory \"/var/named\"; };\n"),
    );

    let result = server.add_zone(&zone("example.com"), ZoneConfig::master(Vec::new()));

    assert!(matches!(result, Err(DnsConfigError::NotConfigured { .. })));
    assert!(server.host().file("/var/named/db.example.com").is_none());
}

#[test]
fn slave_zone_is_registered_without_zone_file() {
    let server = configured_server();

    server
        .add_zone(
            &zone("partner.example"),
            ZoneConfig::slave(vec!["10.0.0.53".parse().unwrap()]),
        )
        .unwrap();

    let registry = server.host().file(REGISTRY).unwrap();
    assert!(registry.contains("type slave;"));
    assert!(registry.contains("masters { 10.0.0.53; };"));
    assert!(registry.contains("file \"slaves/db.partner.example\";"));
    assert!(!server.host().ran("named-checkzone"));
}

#[test]
fn ptr_zone_name_is_derived_from_network() {
    let server = configured_server();
    let network: Cidr = "192.168.1.0/24".parse().unwrap();
    let config = PtrZoneConfig::new(vec![
        PtrRecord::parse("192.168.1.10=host.example.com").unwrap(),
    ])
    .with_serial(1);

    let name = server.add_ptr_zone(&network, config).unwrap();

    assert_eq!(name.as_str(), "1.168.192.in-addr.arpa");
    let text = server
        .host()
        .file("/var/named/db.1.168.192.in-addr.arpa")
        .unwrap();
    let ptr = text.lines().find(|line| line.starts_with("10 ")).unwrap();
    assert!(ptr.contains(" PTR "));
    assert!(ptr.ends_with("host.example.com."));
    assert!(server.host().ran(
        "named-checkzone 1.168.192.in-addr.arpa /var/named/db.1.168.192.in-addr.arpa.dnsmgr-new"
    ));
}

#[test]
fn ptr_outside_network_is_rejected() {
    let server = configured_server();
    let network: Cidr = "192.168.1.0/24".parse().unwrap();
    let config = PtrZoneConfig::new(vec![PtrRecord::parse("10.0.0.1=host.example.com").unwrap()]);

    let result = server.add_ptr_zone(&network, config);

    assert!(matches!(result, Err(DnsConfigError::ZoneConfig(_))));
    assert!(server.host().commands().is_empty());
}
