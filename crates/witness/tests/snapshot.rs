use pretty_assertions::assert_eq;
use rstest as _;
use witness::witness;
use witness_codegen as _;
use witness_macros as _;
use witness_registry as _;

#[witness(conformance_init)]
trait Diffable {
	fn diff(old: &Self, new: &Self) -> Option<(String, Vec<String>)>;
	fn data(&self) -> Vec<u8>;
	fn from(data: &[u8]) -> Self;
}

#[witness(conformance_init, nested(Format))]
trait Snapshottable {
	type Format: Diffable;
	const VERSION: u32;
	fn path_extension() -> String;
	fn snapshot(&self) -> Self::Format;
}

impl Diffable for String {
	fn diff(old: &Self, new: &Self) -> Option<(String, Vec<String>)> {
		if old == new {
			return None;
		}
		let changed = old.lines().zip(new.lines()).filter(|(a, b)| a != b).map(|(_, b)| b.to_owned()).collect();
		Some((format!("-{old}\n+{new}"), changed))
	}

	fn data(&self) -> Vec<u8> {
		self.as_bytes().to_vec()
	}

	fn from(data: &[u8]) -> Self {
		String::from_utf8_lossy(data).into_owned()
	}
}

impl Snapshottable for String {
	type Format = String;
	const VERSION: u32 = 1;

	fn path_extension() -> String {
		"txt".to_owned()
	}

	fn snapshot(&self) -> String {
		self.clone()
	}
}

#[derive(Debug, Clone, PartialEq)]
struct Document {
	title: String,
	body: String,
}

impl Snapshottable for Document {
	type Format = String;
	const VERSION: u32 = 3;

	fn path_extension() -> String {
		"md".to_owned()
	}

	fn snapshot(&self) -> String {
		format!("# {}\n{}", self.title, self.body)
	}
}

fn document(title: &str, body: &str) -> Document {
	Document { title: title.to_owned(), body: body.to_owned() }
}

#[test]
fn conforming_diffable_reads_the_implementation() {
	let lines = DiffableWitness::<String>::conforming();
	assert_eq!((lines.data)("abc".to_owned()), b"abc".to_vec());
	assert_eq!((lines.from)(b"xyz".to_vec()), "xyz");
	assert_eq!((lines.diff)("same".to_owned(), "same".to_owned()), None);

	let (summary, changed) = (lines.diff)("a\nb".to_owned(), "a\nc".to_owned()).unwrap();
	assert_eq!(summary, "-a\nb\n+a\nc");
	assert_eq!(changed, ["c"]);
}

#[test]
fn conforming_snapshot_builds_the_nested_witness() {
	let strategy = SnapshottableWitness::<Document, String>::conforming();
	assert_eq!((strategy.version)(), 3);
	assert_eq!((strategy.path_extension)(), "md");

	let snapshot = (strategy.snapshot)(document("Notes", "hello"));
	assert_eq!(snapshot, "# Notes\nhello");
	assert_eq!((strategy.format.data)(snapshot), b"# Notes\nhello".to_vec());
}

#[test]
fn pullback_reuses_the_format() {
	let lines = SnapshottableWitness::<String, String>::conforming();
	let titles = lines.pullback(|doc: Document| doc.title);

	assert_eq!((titles.snapshot)(document("Release", "ignored")), "Release");
	assert_eq!((titles.version)(), 1);
	assert_eq!((titles.path_extension)(), "txt");
	assert_eq!((titles.format.from)(b"raw".to_vec()), "raw");
}

#[test]
fn handwritten_strategy_with_nested_witness() {
	let bytes = DiffableWitness::<Vec<u8>>::new(
		|old, new| (old != new).then(|| (format!("{} -> {} bytes", old.len(), new.len()), Vec::new())),
		|data| data,
		|data| data,
	);
	let raw = SnapshottableWitness::<Document, Vec<u8>>::new(bytes, || 2, || "bin".to_owned(), |doc| doc.body.into_bytes());

	let snapshot = (raw.snapshot)(document("t", "abc"));
	assert_eq!(snapshot, b"abc".to_vec());
	assert_eq!((raw.format.diff)(snapshot, b"abcd".to_vec()).map(|(summary, _)| summary), Some("3 -> 4 bytes".to_owned()));
}

#[test]
fn diffable_iso_moves_through_documents() {
	let lines = DiffableWitness::<String>::conforming();
	let documents = lines.iso(
		|doc: Document| format!("{}\n{}", doc.title, doc.body),
		|text: String| {
			let (title, body) = text.split_once('\n').unwrap_or((text.as_str(), ""));
			document(title, body)
		},
	);

	let doc = document("Title", "body");
	let bytes = (documents.data)(doc.clone());
	assert_eq!((documents.from)(bytes), doc);
	assert_eq!((documents.diff)(doc.clone(), doc.clone()), None);
	assert!((documents.diff)(doc, document("Title", "changed")).is_some());
}

#[witness]
trait Labeled {
	type Label: std::fmt::Display;
	fn text(&self) -> Self::Label;
}

impl Labeled for Document {
	type Label = String;

	fn text(&self) -> String {
		self.title.clone()
	}
}

#[test]
fn ordinary_bounds_stay_plain_parameters() {
	let numbered = LabeledWitness::<u8, String>::new(|n| format!("#{n}"));
	let titled = numbered.pullback(|doc: Document| doc.body.len() as u8);
	assert_eq!((titled.text)(document("t", "abc")), "#3");
	assert_eq!(document("t", "abc").text(), "t");
}
