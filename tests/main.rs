//! End-to-end scenarios over real sockets, against the local-filesystem
//! back-end.

mod common;

use common::{data_connect, data_read_all, start_running, wait_status, TestClient};
use microftp::{Server, ServerFault, ServerStatus};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test]
async fn s1_minimal_session() {
    let root = tempfile::tempdir().unwrap();
    let server = Server::with_fs(root.path()).control_port(2121);
    start_running(&server).await;

    let mut client = TestClient::connect(2121).await;
    assert_eq!(
        client.line().await,
        "220 -> CMS FTP Server, FTP Version 2020-08-20"
    );
    client.send("USER user").await;
    assert_eq!(client.line().await, "331 OK. Password required");
    client.send("PASS pass").await;
    assert_eq!(client.line().await, "230 OK, logged in as user");
    client.send("PWD").await;
    assert_eq!(client.line().await, "257 \"/\" is your current directory");
    client.send("QUIT").await;
    assert_eq!(client.line().await, "221 Goodbye");
    client.expect_eof().await;
}

#[tokio::test]
async fn login_gate_stays_silent_before_login() {
    let root = tempfile::tempdir().unwrap();
    let server = Server::with_fs(root.path()).control_port(2122);
    start_running(&server).await;

    let mut client = TestClient::connect_greeted(2122).await;
    client.send("PWD").await;
    assert!(client.stays_silent(Duration::from_millis(1500)).await);
    client.send("RETR secret.bin").await;
    assert!(client.stays_silent(Duration::from_millis(1500)).await);

    // The next reply on the wire belongs to USER, proving the gated
    // verbs produced nothing at all.
    client.send("USER user").await;
    client.expect("331 ").await;
}

#[tokio::test]
async fn s2_passive_directory_listing() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("file.bin"), vec![0u8; 100]).unwrap();
    std::fs::create_dir(root.path().join("sub")).unwrap();

    let server = Server::with_fs(root.path())
        .control_port(2123)
        .data_port_base(56100);
    start_running(&server).await;

    let mut client = TestClient::connect_logged_in(2123).await;
    let port = client.pasv_port().await;
    // First session on slot 0: base + rotating offset of 1.
    assert_eq!(port, 56100 + 1);

    let data = data_connect(port).await;
    client.send("LIST").await;
    client.expect("150 ").await;
    let listing = String::from_utf8(data_read_all(data).await).unwrap();
    client.expect("226 Directory send OK.").await;

    let mut lines: Vec<&str> = listing.split("\r\n").filter(|l| !l.is_empty()).collect();
    lines.sort_unstable();
    assert_eq!(lines, vec!["+/,\tsub", "+r,s100,\tfile.bin"]);
}

#[tokio::test]
async fn nlst_streams_bare_names() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("a.txt"), b"a").unwrap();
    std::fs::write(root.path().join(".hidden"), b"h").unwrap();

    let server = Server::with_fs(root.path())
        .control_port(2124)
        .data_port_base(56200);
    start_running(&server).await;

    let mut client = TestClient::connect_logged_in(2124).await;
    let port = client.pasv_port().await;
    let data = data_connect(port).await;
    client.send("NLST").await;
    client.expect("150 ").await;
    let listing = String::from_utf8(data_read_all(data).await).unwrap();
    client.expect("226 ").await;
    assert_eq!(listing, "a.txt\r\n");
}

#[tokio::test]
async fn mlsd_lists_machine_readable_entries() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("data.bin"), vec![7u8; 42]).unwrap();
    std::fs::create_dir(root.path().join("dir")).unwrap();

    let server = Server::with_fs(root.path())
        .control_port(2125)
        .data_port_base(56300);
    start_running(&server).await;

    let mut client = TestClient::connect_logged_in(2125).await;
    let port = client.pasv_port().await;
    let data = data_connect(port).await;
    client.send("MLSD").await;
    client.expect("150 ").await;
    let listing = String::from_utf8(data_read_all(data).await).unwrap();
    let tail = client.expect("226 Options: -a -l, ").await;
    assert!(tail.contains("2 matches total"), "got {:?}", tail);

    let mut lines: Vec<&str> = listing.split("\r\n").filter(|l| !l.is_empty()).collect();
    lines.sort_unstable();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Type=dir;Size=0;") && lines[0].ends_with(" dir"));
    assert!(lines[1].starts_with("Type=file;Size=42;") && lines[1].ends_with(" data.bin"));
}

#[tokio::test]
async fn retr_delivers_exact_bytes() {
    let root = tempfile::tempdir().unwrap();
    let payload: Vec<u8> = (0..70_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(root.path().join("blob.bin"), &payload).unwrap();

    let server = Server::with_fs(root.path())
        .control_port(2126)
        .data_port_base(56400);
    start_running(&server).await;

    let mut client = TestClient::connect_logged_in(2126).await;
    let port = client.pasv_port().await;
    let data = data_connect(port).await;
    client.send("RETR blob.bin").await;
    let banner = client.expect("150 ").await;
    assert!(banner.contains("70000 bytes"), "got {:?}", banner);
    let received = data_read_all(data).await;
    client.expect("226 File successfully transferred").await;
    assert_eq!(received, payload);

    // The working directory survived the path build/restore cycle.
    client.send("PWD").await;
    client.expect("257 \"/\"").await;
}

#[tokio::test]
async fn retr_missing_file_is_550() {
    let root = tempfile::tempdir().unwrap();
    let server = Server::with_fs(root.path())
        .control_port(2127)
        .data_port_base(56500);
    start_running(&server).await;

    let mut client = TestClient::connect_logged_in(2127).await;
    client.send("RETR nope.bin").await;
    client.expect("550 File nope.bin not found").await;
}

#[tokio::test]
async fn s4_s5_rename_flow() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("a.txt"), b"payload").unwrap();

    let server = Server::with_fs(root.path()).control_port(2128);
    start_running(&server).await;

    let mut client = TestClient::connect_logged_in(2128).await;
    client.send("RNFR a.txt").await;
    client.expect("350 ").await;
    client.send("RNTO b.txt").await;
    client.expect("250 File successfully renamed or moved").await;
    client.send("QUIT").await;
    client.expect("221 ").await;
    client.expect_eof().await;
    assert!(root.path().join("b.txt").exists());
    assert!(!root.path().join("a.txt").exists());

    // A fresh login has no rename source.
    sleep(Duration::from_millis(300)).await;
    let mut client = TestClient::connect_logged_in(2128).await;
    client.send("RNTO c.txt").await;
    client.expect("503 Need RNFR before RNTO").await;
}

#[tokio::test]
async fn s6_mdtm_set_then_query() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("f.txt"), b"x").unwrap();

    let server = Server::with_fs(root.path()).control_port(2129);
    start_running(&server).await;

    let mut client = TestClient::connect_logged_in(2129).await;
    client.send("MDTM 20240115103000 f.txt").await;
    client.expect("200 Ok").await;
    client.send("MDTM f.txt").await;
    assert_eq!(client.line().await, "213 20240115103000");
}

#[tokio::test]
async fn directory_and_size_commands() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("f.dat"), vec![1u8; 1234]).unwrap();

    let server = Server::with_fs(root.path()).control_port(2130);
    start_running(&server).await;

    let mut client = TestClient::connect_logged_in(2130).await;

    client.send("MKD box").await;
    client.expect("257 \"box\" created").await;
    // MKD leaves the working directory at the new directory.
    client.send("PWD").await;
    client.expect("257 \"/box\"").await;
    client.send("CDUP").await;
    client.expect("250 Directory successfully changed to root.").await;

    client.send("MKD box").await;
    client.expect("521 \"box\" directory already exists").await;

    client.send("CWD box").await;
    client.expect("250 Directory successfully changed.").await;
    client.send("CWD /").await;
    client.expect("250 ").await;

    client.send("RMD box").await;
    client.expect("250 \"box\" removed").await;
    client.send("RMD box").await;
    client.expect("550 Directory \"box\" not found").await;

    client.send("SIZE f.dat").await;
    client.expect("213 1234").await;
    client.send("SIZE missing").await;
    client.expect("550 No such file").await;

    client.send("DELE f.dat").await;
    client.expect("250 Deleted f.dat").await;
    client.send("DELE f.dat").await;
    client.expect("550 file f.dat not found").await;
}

#[tokio::test]
async fn simple_verbs_and_unknown_commands() {
    let root = tempfile::tempdir().unwrap();
    let server = Server::with_fs(root.path()).control_port(2131);
    start_running(&server).await;

    let mut client = TestClient::connect_logged_in(2131).await;

    client.send("SYST").await;
    client.expect("215 FTP Server, V1.0").await;

    client.send("FEAT").await;
    assert_eq!(client.line().await, "211-Extensions supported:");
    assert_eq!(client.line().await, " MDTM");
    assert_eq!(client.line().await, " MLSD");
    assert_eq!(client.line().await, " SIZE");
    assert_eq!(client.line().await, " SITE FREE");
    assert_eq!(client.line().await, "211 End.");

    client.send("NOOP").await;
    client.expect("200 Zzz...").await;

    client.send("TYPE A").await;
    client.expect("200 TYPE is now ASCII").await;
    client.send("TYPE I").await;
    client.expect("200 TYPE is now 8-bit binary").await;
    client.send("TYPE X").await;
    client.expect("504 ").await;

    client.send("STRU F").await;
    client.expect("200 F Ok").await;
    client.send("STRU R").await;
    client.expect("504 ").await;

    client.send("MODE S").await;
    client.expect("200 S Ok").await;
    client.send("MODE B").await;
    client.expect("504 ").await;

    client.send("STAT").await;
    client.expect("221 FTP Server status: you will be disconnected after 1 minutes").await;

    client.send("AUTH TLS").await;
    client.expect("504 Not available").await;

    client.send("SITE FREE").await;
    let free = client.expect("211 ").await;
    assert!(free.contains("MB free of"), "got {:?}", free);
    client.send("SITE CHMOD 777 x").await;
    client.expect("550 Unknown SITE command").await;

    client.send("XYZZY").await;
    client.expect("500 Unknown command").await;
}

#[tokio::test]
async fn wrong_credentials_are_rejected() {
    let root = tempfile::tempdir().unwrap();
    let server = Server::with_fs(root.path()).control_port(2132);
    start_running(&server).await;

    let mut client = TestClient::connect_greeted(2132).await;
    client.send("PASS pass").await;
    client.expect("530 User not specified").await;
    client.send("USER mallory").await;
    client.expect("530 Username not known").await;
    client.send("USER user").await;
    client.expect("331 ").await;
    client.send("PASS wrong").await;
    client.expect("530 Password not correct").await;
    client.send("PASS pass").await;
    client.expect("230 ").await;
}

#[tokio::test]
async fn slot_exhaustion_sends_421() {
    let root = tempfile::tempdir().unwrap();
    let server = Server::with_fs(root.path()).control_port(2133).clients(1);
    start_running(&server).await;

    let _active = TestClient::connect_greeted(2133).await;
    let mut refused = TestClient::connect(2133).await;
    assert_eq!(refused.line().await, "421 No more connections allowed");
    refused.expect_eof().await;
}

#[tokio::test]
async fn passive_port_rotates_between_sessions() {
    let root = tempfile::tempdir().unwrap();
    let server = Server::with_fs(root.path())
        .control_port(2134)
        .data_port_base(56600);
    start_running(&server).await;

    let mut client = TestClient::connect_logged_in(2134).await;
    let first = client.pasv_port().await;
    client.send("QUIT").await;
    client.expect("221 ").await;
    client.expect_eof().await;

    sleep(Duration::from_millis(300)).await;
    let mut client = TestClient::connect_logged_in(2134).await;
    let second = client.pasv_port().await;

    assert_eq!(first, 56600 + 1);
    assert_eq!(second, first + 1);
}

#[tokio::test]
async fn pasv_answers_421_when_disabled() {
    let root = tempfile::tempdir().unwrap();
    let server = Server::with_fs(root.path())
        .control_port(2135)
        .passive_mode(false);
    start_running(&server).await;

    let mut client = TestClient::connect_logged_in(2135).await;
    client.send("PASV").await;
    client.expect("421 Passive mode not available").await;
}

#[tokio::test]
async fn stop_drains_to_idle_and_restarts() {
    let root = tempfile::tempdir().unwrap();
    let server = Server::with_fs(root.path()).control_port(2136);
    start_running(&server).await;

    // An active session is aborted by the stop flag within its read
    // tick, well inside the six-second drain window.
    let mut client = TestClient::connect_logged_in(2136).await;
    server.stop().unwrap();
    wait_status(&server, ServerStatus::Idle, Duration::from_secs(7)).await;
    client.expect_eof().await;
    assert_eq!(server.faults() & ServerFault::NotAllTasksDisabled.bit(), 0);

    let stats = server.stats();
    assert_eq!(stats.clients_max, 1);
    assert!(stats.clients_connected >= 1);
    assert_eq!(stats.clients_active, 0);

    // The pool is reusable: start again, serve, stop again.
    server.start().await.unwrap();
    wait_status(&server, ServerStatus::Running, Duration::from_secs(5)).await;
    let mut client = TestClient::connect_logged_in(2136).await;
    client.send("QUIT").await;
    client.expect("221 ").await;
    server.stop().unwrap();
    wait_status(&server, ServerStatus::Idle, Duration::from_secs(7)).await;
}

#[tokio::test]
async fn lifecycle_transitions_are_guarded() {
    let root = tempfile::tempdir().unwrap();
    let server = Server::with_fs(root.path()).control_port(2137);

    assert!(server.stop().is_err(), "stop from Idle must fail");
    start_running(&server).await;
    assert!(server.start().await.is_err(), "start from Running must fail");
    server.stop().unwrap();
    wait_status(&server, ServerStatus::Idle, Duration::from_secs(7)).await;
}

#[tokio::test]
async fn active_mode_port_transfer() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("active.bin"), b"active mode payload").unwrap();

    let server = Server::with_fs(root.path()).control_port(2138);
    start_running(&server).await;

    let mut client = TestClient::connect_logged_in(2138).await;

    // Listen on a client-side data port and advertise it with PORT.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    client
        .send(&format!("PORT 127,0,0,1,{},{}", port >> 8, port & 0xff))
        .await;
    client.expect("200 PORT command successful").await;

    client.send("RETR active.bin").await;
    let (mut data, _) = listener.accept().await.unwrap();
    client.expect("150 ").await;
    let mut received = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut data, &mut received)
        .await
        .unwrap();
    client.expect("226 File successfully transferred").await;
    assert_eq!(received, b"active mode payload");
}

#[tokio::test]
async fn port_with_bad_tuple_is_501() {
    let root = tempfile::tempdir().unwrap();
    let server = Server::with_fs(root.path()).control_port(2139);
    start_running(&server).await;

    let mut client = TestClient::connect_logged_in(2139).await;
    client.send("PORT").await;
    client.expect("501 no parameters given").await;
    client.send("PORT 1,2,3").await;
    client.expect("501 Can't interpret parameters").await;

    // With no mode negotiated, a transfer cannot open a data channel.
    client.send("RETR whatever").await;
    client.expect("550 ").await;
}

#[tokio::test]
async fn idle_session_is_disconnected_without_a_reply() {
    let root = tempfile::tempdir().unwrap();
    let server = Server::with_fs(root.path())
        .control_port(2141)
        .read_timeout(Duration::from_millis(100))
        .inactive_count(3);
    start_running(&server).await;

    let mut client = TestClient::connect_greeted(2141).await;
    // No command for 3 × 100 ms: the server hangs up silently.
    client.expect_eof().await;
}

#[tokio::test]
async fn bind_failure_faults_the_server_and_clears() {
    // Occupy the control port so Starting fails.
    let blocker = tokio::net::TcpListener::bind("0.0.0.0:2142").await.unwrap();

    let root = tempfile::tempdir().unwrap();
    let server = Server::with_fs(root.path()).control_port(2142);
    server.start().await.unwrap();
    wait_status(&server, ServerStatus::Error, Duration::from_secs(8)).await;
    assert_ne!(server.faults() & ServerFault::ListenerBind.bit(), 0);

    // Release the port, clear the bitmap and start over.
    drop(blocker);
    server.clear_errors();
    assert_eq!(server.faults(), 0);
    server.start().await.unwrap();
    wait_status(&server, ServerStatus::Running, Duration::from_secs(5)).await;

    let mut client = TestClient::connect_greeted(2142).await;
    client.send("QUIT").await;
    client.expect("221 ").await;
}

#[tokio::test]
async fn custom_credentials_apply_to_new_logins() {
    let root = tempfile::tempdir().unwrap();
    let server = Server::with_fs(root.path()).control_port(2140);
    server.set_credentials("operator", "hunter2").await;
    start_running(&server).await;

    let mut client = TestClient::connect_greeted(2140).await;
    client.send("USER user").await;
    client.expect("530 Username not known").await;
    client.send("USER operator").await;
    client.expect("331 ").await;
    client.send("PASS hunter2").await;
    client.expect("230 ").await;
}
