//! Discovery and fetch against an in-memory transport.

use std::cell::RefCell;

use git_hash::ObjectId;
use git_protocol::pktline::PktLineWriter;
use git_protocol::sideband::{write_sideband_data, Band};
use git_protocol::{discover, fetch_pack, ProtocolError};
use git_transport::{Transport, TransportError};

const HEAD: &str = "3b18e512dba79e4c8300dd08aeb37f8e728b8dad";

struct FakeRemote {
    advert: Vec<u8>,
    response: Vec<u8>,
    requests: RefCell<Vec<Vec<u8>>>,
}

impl Transport for FakeRemote {
    fn advertised_refs(&self) -> Result<Vec<u8>, TransportError> {
        Ok(self.advert.clone())
    }

    fn upload_pack(&self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.requests.borrow_mut().push(request.to_vec());
        Ok(self.response.clone())
    }
}

struct Unreachable;

impl Transport for Unreachable {
    fn advertised_refs(&self) -> Result<Vec<u8>, TransportError> {
        Err(TransportError::Http {
            status: 503,
            message: "Service Unavailable".into(),
        })
    }

    fn upload_pack(&self, _request: &[u8]) -> Result<Vec<u8>, TransportError> {
        unreachable!("no fetch without discovery")
    }
}

fn advert() -> Vec<u8> {
    let mut buf = Vec::new();
    let mut w = PktLineWriter::new(&mut buf);
    w.write_text("# service=git-upload-pack").unwrap();
    w.write_flush().unwrap();
    w.write_line(format!("{HEAD} HEAD\0symref=HEAD:refs/heads/main no-progress\n").as_bytes())
        .unwrap();
    w.write_text(&format!("{HEAD} refs/heads/main")).unwrap();
    w.write_flush().unwrap();
    buf
}

fn response(pack: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut w = PktLineWriter::new(&mut buf);
    w.write_text("packfile").unwrap();
    write_sideband_data(&mut w, Band::Data, pack).unwrap();
    w.write_flush().unwrap();
    buf
}

#[test]
fn discover_then_fetch() {
    let mut pack = b"PACK\0\0\0\x02\0\0\0\0".to_vec();
    pack.extend_from_slice(&[0; 20]);
    let remote = FakeRemote {
        advert: advert(),
        response: response(&pack),
        requests: RefCell::new(Vec::new()),
    };

    let adv = discover(&remote).unwrap();
    assert_eq!(adv.head_symref(), Some("refs/heads/main"));
    let wants = adv.wants();
    assert_eq!(wants, vec![ObjectId::from_hex(HEAD).unwrap()]);

    let data = fetch_pack(&remote, &wants, "minigit/test").unwrap();
    assert_eq!(data.version, 2);
    assert_eq!(data.stream().unwrap().object_count(), 0);

    let requests = remote.requests.borrow();
    assert_eq!(requests.len(), 1);
    let request = String::from_utf8_lossy(&requests[0]);
    assert!(request.starts_with("0012command=fetch\n"));
    assert!(request.contains(&format!("want {HEAD}\n")));
    assert_eq!(request.matches("want ").count(), 1);
    assert!(request.ends_with("0009done\n0000"));
}

#[test]
fn transport_errors_pass_through() {
    assert!(matches!(
        discover(&Unreachable),
        Err(ProtocolError::Transport(TransportError::Http { status: 503, .. }))
    ));
}

#[test]
fn remote_error_during_fetch() {
    let mut response = Vec::new();
    let mut w = PktLineWriter::new(&mut response);
    w.write_text("packfile").unwrap();
    w.write_line(b"\x03upload-pack: not our ref\n").unwrap();
    w.write_flush().unwrap();

    let remote = FakeRemote {
        advert: advert(),
        response,
        requests: RefCell::new(Vec::new()),
    };
    let wants = discover(&remote).unwrap().wants();
    assert!(matches!(
        fetch_pack(&remote, &wants, "minigit/test"),
        Err(ProtocolError::ServerError(msg)) if msg == "upload-pack: not our ref"
    ));
}
