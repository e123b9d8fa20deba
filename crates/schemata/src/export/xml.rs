//! Thin event writer shared by the XML-producing backends.

use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use super::Error;

/// Indenting XML writer that reports failures as export errors.
pub(crate) struct XmlWriter {
    writer: Writer<Vec<u8>>,
}

impl XmlWriter {
    pub fn new(indent: usize) -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', indent),
        }
    }

    pub fn declaration(&mut self) -> Result<(), Error> {
        self.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    /// Comments are written verbatim; `text` must not contain `--`.
    pub fn comment(&mut self, text: &str) -> Result<(), Error> {
        self.write(Event::Comment(BytesText::from_escaped(format!(" {text} "))))
    }

    pub fn start(&mut self, tag: &str, attributes: &[(&str, &str)]) -> Result<(), Error> {
        let element = BytesStart::new(tag).with_attributes(attributes.iter().copied());
        self.write(Event::Start(element))
    }

    pub fn empty(&mut self, tag: &str, attributes: &[(&str, &str)]) -> Result<(), Error> {
        let element = BytesStart::new(tag).with_attributes(attributes.iter().copied());
        self.write(Event::Empty(element))
    }

    pub fn text(&mut self, text: &str) -> Result<(), Error> {
        self.write(Event::Text(BytesText::new(text)))
    }

    pub fn end(&mut self, tag: &str) -> Result<(), Error> {
        self.write(Event::End(BytesEnd::new(tag)))
    }

    /// Returns the document text with a trailing newline.
    pub fn finish(self) -> Result<String, Error> {
        let mut document = String::from_utf8(self.writer.into_inner())
            .map_err(|err| Error::Serialization(err.to_string()))?;
        document.push('\n');
        Ok(document)
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), Error> {
        self.writer
            .write_event(event)
            .map_err(|err| Error::Serialization(err.to_string()))
    }
}
