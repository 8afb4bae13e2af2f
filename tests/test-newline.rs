use std::fs::OpenOptions;
use std::io::Write;

use logwatch::FileTailer;
use tempfile::tempdir;

#[test]
pub fn test_newline() {
    let expected_line = "foo bar".to_string();

    let logdir = tempdir().unwrap();
    let logfile = logdir.path().join("foo.log");
    std::fs::write(&logfile, "").unwrap();

    let mut tailer = FileTailer::new(&logfile).unwrap();
    let mut f = OpenOptions::new().append(true).open(&logfile).unwrap();

    f.write_all(b"foo").unwrap();
    assert!(tailer.poll().unwrap().is_empty());

    f.write_all(b" bar").unwrap();
    assert!(tailer.poll().unwrap().is_empty());

    f.write_all(b"\r\n").unwrap();
    let sets = tailer.poll().unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].lines(), &[expected_line]);
    assert_eq!(sets[0].source(), logfile.canonicalize().unwrap());
}
