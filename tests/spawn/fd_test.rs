/*!
 * Descriptor Tests
 * Pipes stay private to the parent unless wired in with a file action
 */

use pretty_assertions::assert_eq;
use pspawn::{dup, pipe, SpawnRequest};
use std::fs::OpenOptions;
use std::io::Read;
use std::os::fd::AsRawFd;

#[test]
fn test_pipe_is_not_inherited() {
    let (mut reader, writer) = pipe().unwrap();
    let devnull = OpenOptions::new().write(true).open("/dev/null").unwrap();
    let script = format!("echo leaked >&{}", writer.as_raw_fd());

    let code = SpawnRequest::new("sh")
        .args(["-c", script.as_str()])
        .stderr(&devnull)
        .run()
        .unwrap();
    drop(writer);

    assert_ne!(code, 0);
    let mut out = String::new();
    reader.read_to_string(&mut out).unwrap();
    assert_eq!(out, "");
}

#[test]
fn test_pipe_wired_as_stdout() {
    let (mut reader, writer) = pipe().unwrap();

    let mut child = SpawnRequest::new("echo")
        .arg("through the pipe")
        .stdout(&writer)
        .spawn()
        .unwrap();
    drop(writer);
    assert_eq!(child.wait().unwrap(), 0);

    let mut out = String::new();
    reader.read_to_string(&mut out).unwrap();
    assert_eq!(out, "through the pipe\n");
}

#[test]
fn test_pipe_wired_as_stdin() {
    let (reader, mut writer) = pipe().unwrap();
    let (mut out_reader, out_writer) = pipe().unwrap();

    let mut child = SpawnRequest::new("cat")
        .stdin(&reader)
        .stdout(&out_writer)
        .spawn()
        .unwrap();
    drop(reader);
    drop(out_writer);

    std::io::Write::write_all(&mut writer, b"round trip").unwrap();
    drop(writer);
    assert_eq!(child.wait().unwrap(), 0);

    let mut out = String::new();
    out_reader.read_to_string(&mut out).unwrap();
    assert_eq!(out, "round trip");
}

#[test]
fn test_dup_wired_to_high_descriptor() {
    let (mut reader, writer) = pipe().unwrap();
    let copy = dup(&writer).unwrap();
    drop(writer);

    let code = SpawnRequest::new("sh")
        .args(["-c", "echo nine >&9"])
        .dup2(&copy, 9)
        .run()
        .unwrap();
    drop(copy);

    assert_eq!(code, 0);
    let mut out = String::new();
    reader.read_to_string(&mut out).unwrap();
    assert_eq!(out, "nine\n");
}
