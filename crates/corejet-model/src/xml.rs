//! CoreJet catalogue XML codec.
//!
//! ```text
//! <requirementscatalogue project=".." extractTime=".." testTime="..">
//!   <epic id=".." title="..">
//!     <story id=".." title=".." points=".." priority="..">
//!       <given>shared step</given>
//!       <scenario name=".." testStatus="pass">
//!         <given>..</given> <when>..</when> <then>..</then>
//!       </scenario>
//!     </story>
//!   </epic>
//! </requirementscatalogue>
//! ```
//!
//! Step order and unrecognized attributes survive a read/write cycle.

use std::io::Write;
use std::path::Path;

use corejet_error::{CoreJetError, Result};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::debug;

use crate::catalogue::{Catalogue, Epic, Scenario, ScenarioStatus, Story};
use crate::step::{Step, StepKind, StepSet};

const ROOT: &str = "requirementscatalogue";
const EPIC: &str = "epic";
const STORY: &str = "story";
const SCENARIO: &str = "scenario";

impl Catalogue {
    /// Parse a catalogue document.
    pub fn from_xml_str(xml: &str) -> Result<Self> {
        parse_catalogue(xml)
    }

    /// Read and parse a catalogue document from disk.
    pub fn read_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|err| {
            std::io::Error::new(err.kind(), format!("{}: {err}", path.display()))
        })?;
        let catalogue = parse_catalogue(&contents).map_err(|err| match err {
            CoreJetError::CatalogueParse { detail } => {
                CoreJetError::catalogue_parse(format!("{}: {detail}", path.display()))
            }
            other => other,
        })?;
        debug!(
            path = %path.display(),
            epics = catalogue.epics.len(),
            scenarios = catalogue.scenario_count(),
            "catalogue loaded"
        );
        Ok(catalogue)
    }

    /// Serialize the catalogue, including any scenario statuses.
    pub fn write<W: Write>(&self, output: W) -> Result<()> {
        write_catalogue(self, output)
    }

    pub fn to_xml_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        write_catalogue(self, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|err| CoreJetError::report(format!("catalogue XML is not UTF-8: {err}")))
    }
}

type Attributes = Vec<(String, String)>;

fn read_attributes(element: &BytesStart<'_>) -> Result<Attributes> {
    let mut attributes = Vec::new();
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|err| CoreJetError::catalogue_parse(err.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|err| CoreJetError::catalogue_parse(err.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(attributes)
}

/// Remove the first attribute named `key` and return its value.
fn take_attribute(attributes: &mut Attributes, key: &str) -> Option<String> {
    let index = attributes.iter().position(|(name, _)| name == key)?;
    Some(attributes.remove(index).1)
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Incremental tree builder fed by reader events.
#[derive(Default)]
struct CatalogueBuilder {
    catalogue: Option<Catalogue>,
    finished: bool,
    epic: Option<Epic>,
    story: Option<Story>,
    scenario: Option<Scenario>,
    step: Option<(StepKind, String)>,
    /// Depth inside elements this format does not know about.
    skip_depth: usize,
}

impl CatalogueBuilder {
    fn open(&mut self, element: &BytesStart<'_>) -> Result<()> {
        if self.skip_depth > 0 {
            self.skip_depth += 1;
            return Ok(());
        }

        let name = element.name();
        let name = name.as_ref();
        if let Some(kind) = StepKind::from_element_name(name) {
            if self.story.is_none() {
                return Err(CoreJetError::catalogue_parse(format!(
                    "<{kind}> step outside of a story"
                )));
            }
            self.step = Some((kind, String::new()));
            return Ok(());
        }

        let mut attributes = read_attributes(element)?;
        match name {
            b"requirementscatalogue" => {
                if self.catalogue.is_some() {
                    return Err(CoreJetError::catalogue_parse(
                        "more than one <requirementscatalogue> root",
                    ));
                }
                self.catalogue = Some(Catalogue {
                    project: take_attribute(&mut attributes, "project"),
                    extract_time: take_attribute(&mut attributes, "extractTime"),
                    test_time: take_attribute(&mut attributes, "testTime"),
                    epics: Vec::new(),
                    extra: attributes,
                });
            }
            b"epic" => {
                if self.catalogue.is_none() || self.epic.is_some() {
                    return Err(misplaced(EPIC));
                }
                self.epic = Some(Epic {
                    name: identifier(&mut attributes, EPIC)?,
                    title: take_attribute(&mut attributes, "title"),
                    stories: Vec::new(),
                    extra: attributes,
                });
            }
            b"story" => {
                if self.epic.is_none() || self.story.is_some() {
                    return Err(misplaced(STORY));
                }
                self.story = Some(Story {
                    name: identifier(&mut attributes, STORY)?,
                    title: take_attribute(&mut attributes, "title"),
                    steps: StepSet::new(),
                    scenarios: Vec::new(),
                    extra: attributes,
                });
            }
            b"scenario" => {
                if self.story.is_none() || self.scenario.is_some() {
                    return Err(misplaced(SCENARIO));
                }
                let name = take_attribute(&mut attributes, "name").ok_or_else(|| {
                    CoreJetError::catalogue_parse("<scenario> without a name attribute")
                })?;
                let status = take_attribute(&mut attributes, "testStatus")
                    .filter(|value| !value.trim().is_empty())
                    .map(|value| value.parse::<ScenarioStatus>())
                    .transpose()
                    .map_err(|err| {
                        CoreJetError::catalogue_parse(format!("scenario {name:?}: {err}"))
                    })?;
                self.scenario = Some(Scenario {
                    name,
                    steps: StepSet::new(),
                    status,
                    extra: attributes,
                });
            }
            other => {
                debug!(element = %element_name(other), "skipping unknown catalogue element");
                self.skip_depth = 1;
            }
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if self.skip_depth > 0 {
            return;
        }
        if let Some((_, buffer)) = &mut self.step {
            buffer.push_str(text);
        }
    }

    fn close(&mut self, name: &[u8]) -> Result<()> {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return Ok(());
        }

        if StepKind::from_element_name(name).is_some() {
            let Some((kind, text)) = self.step.take() else {
                return Err(CoreJetError::catalogue_parse(format!(
                    "unbalanced </{}>",
                    element_name(name)
                )));
            };
            let step = Step::new(text);
            if let Some(scenario) = &mut self.scenario {
                scenario.steps.push(kind, step);
            } else if let Some(story) = &mut self.story {
                story.steps.push(kind, step);
            }
            return Ok(());
        }

        match name {
            b"scenario" => {
                let scenario = self.scenario.take().ok_or_else(|| unbalanced(SCENARIO))?;
                self.story
                    .as_mut()
                    .ok_or_else(|| misplaced(SCENARIO))?
                    .scenarios
                    .push(scenario);
            }
            b"story" => {
                let story = self.story.take().ok_or_else(|| unbalanced(STORY))?;
                self.epic
                    .as_mut()
                    .ok_or_else(|| misplaced(STORY))?
                    .stories
                    .push(story);
            }
            b"epic" => {
                let epic = self.epic.take().ok_or_else(|| unbalanced(EPIC))?;
                self.catalogue
                    .as_mut()
                    .ok_or_else(|| misplaced(EPIC))?
                    .epics
                    .push(epic);
            }
            b"requirementscatalogue" => {
                self.finished = true;
            }
            other => {
                return Err(CoreJetError::catalogue_parse(format!(
                    "unexpected </{}>",
                    element_name(other)
                )));
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Catalogue> {
        if !self.finished {
            return Err(CoreJetError::catalogue_parse(format!(
                "document ended before </{ROOT}>"
            )));
        }
        self.catalogue
            .ok_or_else(|| CoreJetError::catalogue_parse(format!("missing <{ROOT}> root")))
    }
}

fn identifier(attributes: &mut Attributes, element: &str) -> Result<String> {
    take_attribute(attributes, "id")
        .or_else(|| take_attribute(attributes, "name"))
        .ok_or_else(|| CoreJetError::catalogue_parse(format!("<{element}> without an id")))
}

fn misplaced(element: &str) -> CoreJetError {
    CoreJetError::catalogue_parse(format!("misplaced <{element}> element"))
}

fn unbalanced(element: &str) -> CoreJetError {
    CoreJetError::catalogue_parse(format!("unbalanced </{element}>"))
}

fn parse_catalogue(xml: &str) -> Result<Catalogue> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut builder = CatalogueBuilder::default();

    loop {
        let event = reader.read_event().map_err(|err| {
            CoreJetError::catalogue_parse(format!(
                "at byte {}: {err}",
                reader.buffer_position()
            ))
        })?;
        match event {
            Event::Start(element) => builder.open(&element)?,
            Event::Empty(element) => {
                builder.open(&element)?;
                builder.close(element.name().as_ref())?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|err| CoreJetError::catalogue_parse(err.to_string()))?;
                builder.text(&text);
            }
            Event::CData(data) => {
                builder.text(&String::from_utf8_lossy(&data.into_inner()));
            }
            Event::End(element) => builder.close(element.name().as_ref())?,
            Event::Eof => break,
            _ => {}
        }
    }

    builder.finish()
}

fn write_error(err: impl std::fmt::Display) -> CoreJetError {
    CoreJetError::report(format!("failed to write catalogue XML: {err}"))
}

fn start_element<'a>(name: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
    let mut element = BytesStart::new(name);
    for attribute in attributes {
        element.push_attribute(*attribute);
    }
    element
}

fn push_extra(element: &mut BytesStart<'_>, extra: &[(String, String)]) {
    for (key, value) in extra {
        element.push_attribute((key.as_str(), value.as_str()));
    }
}

fn write_steps<W: Write>(writer: &mut Writer<W>, steps: &StepSet) -> Result<()> {
    for kind in StepKind::ALL {
        for step in steps.steps(kind) {
            let name = kind.element_name();
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(write_error)?;
            writer
                .write_event(Event::Text(BytesText::new(&step.text)))
                .map_err(write_error)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(write_error)?;
        }
    }
    Ok(())
}

fn write_catalogue<W: Write>(catalogue: &Catalogue, output: W) -> Result<()> {
    let mut writer = Writer::new_with_indent(output, b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_error)?;

    let mut root = BytesStart::new(ROOT);
    for (key, value) in [
        ("project", &catalogue.project),
        ("extractTime", &catalogue.extract_time),
        ("testTime", &catalogue.test_time),
    ] {
        if let Some(value) = value {
            root.push_attribute((key, value.as_str()));
        }
    }
    push_extra(&mut root, &catalogue.extra);
    writer.write_event(Event::Start(root)).map_err(write_error)?;

    for epic in &catalogue.epics {
        let mut element = start_element(EPIC, &[("id", epic.name.as_str())]);
        if let Some(title) = &epic.title {
            element.push_attribute(("title", title.as_str()));
        }
        push_extra(&mut element, &epic.extra);
        writer.write_event(Event::Start(element)).map_err(write_error)?;

        for story in &epic.stories {
            let mut element = start_element(STORY, &[("id", story.name.as_str())]);
            if let Some(title) = &story.title {
                element.push_attribute(("title", title.as_str()));
            }
            push_extra(&mut element, &story.extra);
            writer.write_event(Event::Start(element)).map_err(write_error)?;
            write_steps(&mut writer, &story.steps)?;

            for scenario in &story.scenarios {
                let mut element = start_element(SCENARIO, &[("name", scenario.name.as_str())]);
                if let Some(status) = scenario.status {
                    element.push_attribute(("testStatus", status.as_str()));
                }
                push_extra(&mut element, &scenario.extra);
                writer.write_event(Event::Start(element)).map_err(write_error)?;
                write_steps(&mut writer, &scenario.steps)?;
                writer
                    .write_event(Event::End(BytesEnd::new(SCENARIO)))
                    .map_err(write_error)?;
            }

            writer
                .write_event(Event::End(BytesEnd::new(STORY)))
                .map_err(write_error)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(EPIC)))
            .map_err(write_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(ROOT)))
        .map_err(write_error)?;
    writer.into_inner().flush()?;
    Ok(())
}
