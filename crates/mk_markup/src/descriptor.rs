use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::type_name;
use core::fmt::{self, Debug};
use core::slice::Iter;

use crate::{
    BuildError, DescriptorBuilder, Emitter, MarkupStyle, Renderer, SerializeError,
    SerializeErrorKind, Sink,
};

// -----------------------------------------------------------------------------
// Descriptor

/// A sealed, reusable set of field renderers for `T`.
///
/// Serializing writes the `<tag>` line, runs every renderer in registration
/// order, then writes the closing line. A child renderer runs the child's
/// descriptor in place, so the output is a depth-first walk of the object
/// graph in registration order.
///
/// Cloning is cheap: clones share the same renderers. A descriptor holds no
/// per-instance state and is `Send + Sync`, so one descriptor can serialize
/// many instances, from many threads, into separate sinks.
///
/// # Examples
///
/// ```
/// use mk_markup::{Descriptor, MarkupStyle};
///
/// struct Point { x: i32, y: i32 }
/// struct Rect { corner: Point }
///
/// let point = Descriptor::<Point>::builder()
///     .leaf("X", |p| p.x)
///     .leaf("Y", |p| p.y)
///     .build()
///     .unwrap();
///
/// let rect = Descriptor::<Rect>::builder()
///     .child("Corner", &point, |r| &r.corner)
///     .build()
///     .unwrap();
///
/// let value = Rect { corner: Point { x: 3, y: 4 } };
///
/// let text = rect.to_markup(&value, "Box").unwrap();
/// assert_eq!(text, "<Box>\n<Corner>\n<X>3</X>\n<Y>4</Y>\n</Corner>\n</Box>\n");
///
/// let text = rect.to_markup_with(&value, "Box", &MarkupStyle::LEGACY).unwrap();
/// assert_eq!(text, "<Box>\n<Corner>\n<X>3</X>\n<Y>4</Y>\n<Corner>\n<Box>\n");
/// ```
pub struct Descriptor<T> {
    renderers: Arc<[Renderer<T>]>,
}

impl<T> Clone for Descriptor<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            renderers: Arc::clone(&self.renderers),
        }
    }
}

impl<T> Descriptor<T> {
    /// Starts the registration phase for a new descriptor.
    #[inline]
    pub const fn builder() -> DescriptorBuilder<T> {
        DescriptorBuilder::new()
    }

    #[inline]
    pub(crate) fn from_renderers(renderers: Vec<Renderer<T>>) -> Self {
        Self {
            renderers: Arc::from(renderers),
        }
    }

    /// Returns the number of registered renderers.
    #[inline]
    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    /// Iterates the renderers in registration order.
    #[inline]
    pub fn renderers(&self) -> Iter<'_, Renderer<T>> {
        self.renderers.iter()
    }

    /// Iterates the field tags in registration order.
    #[inline]
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.renderers.iter().map(Renderer::tag)
    }

    /// Returns the name of the described type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    /// Returns `true` if both descriptors share the same renderers.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.renderers, &other.renderers)
    }

    /// Serializes `value` as a block tagged `tag`, using [`MarkupStyle::DEFAULT`].
    ///
    /// See [`serialize_with`](Self::serialize_with).
    #[inline]
    pub fn serialize<S: Sink>(&self, sink: S, value: &T, tag: &str) -> Result<(), SerializeError> {
        self.serialize_with(sink, value, tag, &MarkupStyle::DEFAULT)
    }

    /// Serializes `value` as a block tagged `tag`.
    ///
    /// Every line is written before this returns. On error, serialization
    /// stops immediately and lines already written stay in the sink.
    ///
    /// # Errors
    ///
    /// - [`SerializeErrorKind::EmptyTag`] if `tag` is empty.
    /// - [`SerializeErrorKind::Sink`] if the sink fails.
    /// - [`SerializeErrorKind::Accessor`] if a fallible accessor fails.
    /// - [`SerializeErrorKind::Format`] if a value's `Display` impl fails.
    /// - [`SerializeErrorKind::MissingValue`] if an optional field is absent
    ///   under [`MissingPolicy::Fail`](crate::MissingPolicy::Fail).
    pub fn serialize_with<S: Sink>(
        &self,
        mut sink: S,
        value: &T,
        tag: &str,
        style: &MarkupStyle,
    ) -> Result<(), SerializeError> {
        if tag.is_empty() {
            return Err(SerializeError::new(SerializeErrorKind::EmptyTag));
        }

        log::trace!("serializing `{}` as <{tag}>", type_name::<T>());

        let mut out = Emitter::new(&mut sink, style);
        self.serialize_block(value, tag, &mut out)
    }

    /// Serializes `value` into a new `String`, using [`MarkupStyle::DEFAULT`].
    #[inline]
    pub fn to_markup(&self, value: &T, tag: &str) -> Result<String, SerializeError> {
        self.to_markup_with(value, tag, &MarkupStyle::DEFAULT)
    }

    /// Serializes `value` into a new `String`.
    pub fn to_markup_with(
        &self,
        value: &T,
        tag: &str,
        style: &MarkupStyle,
    ) -> Result<String, SerializeError> {
        let mut text = String::new();
        self.serialize_with(&mut text, value, tag, style)?;
        Ok(text)
    }

    /// Writes one block for `value` at the emitter's current depth.
    pub(crate) fn serialize_block(
        &self,
        value: &T,
        tag: &str,
        out: &mut Emitter<'_>,
    ) -> Result<(), SerializeError> {
        self.write_block(value, tag, out)
            .map_err(|e| e.within_block::<T>(tag))
    }

    fn write_block(&self, value: &T, tag: &str, out: &mut Emitter<'_>) -> Result<(), SerializeError> {
        out.open(tag)?;
        for renderer in self.renderers.iter() {
            renderer.render(value, out)?;
        }
        out.close(tag)?;
        Ok(())
    }
}

impl<T: Describe> Descriptor<T> {
    /// Builds the canonical descriptor of `T` from its [`Describe`] impl.
    #[inline]
    pub fn of() -> Result<Self, BuildError> {
        T::describe(Self::builder()).build()
    }
}

impl<T> Debug for Descriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("type", &type_name::<T>())
            .field("renderers", &&*self.renderers)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Describe

/// Types with one canonical descriptor.
///
/// # Examples
///
/// ```
/// use mk_markup::{Describe, Descriptor, DescriptorBuilder};
///
/// struct Country { name: String, area_code: u16 }
///
/// impl Describe for Country {
///     fn describe(builder: DescriptorBuilder<Self>) -> DescriptorBuilder<Self> {
///         builder
///             .leaf_ref("Name", |c| c.name.as_str())
///             .leaf("AreaCode", |c| c.area_code)
///     }
/// }
///
/// let country = Country { name: "Czech Republic".into(), area_code: 420 };
/// let text = Descriptor::<Country>::of().unwrap().to_markup(&country, "Country").unwrap();
/// assert_eq!(
///     text,
///     "<Country>\n<Name>Czech Republic</Name>\n<AreaCode>420</AreaCode>\n</Country>\n",
/// );
/// ```
pub trait Describe: Sized + 'static {
    /// Registers the fields of `Self` on `builder`.
    fn describe(builder: DescriptorBuilder<Self>) -> DescriptorBuilder<Self>;
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use alloc::{format, vec};

    use crate::{
        ClosingTag, Descriptor, LineEnding, MarkupStyle, MissingPolicy, RendererKind, SerializeErrorKind,
        Sink, SinkError,
    };

    // -----------------------------------------------------------------------------
    // Fixtures

    struct Point {
        x: i32,
        y: i32,
    }

    struct Rect {
        corner: Point,
    }

    struct Frame {
        label: &'static str,
        corner: Option<Point>,
    }

    fn point_descriptor() -> Descriptor<Point> {
        Descriptor::<Point>::builder()
            .leaf("X", |p| p.x)
            .leaf("Y", |p| p.y)
            .build()
            .unwrap()
    }

    fn rect_descriptor() -> Descriptor<Rect> {
        Descriptor::<Rect>::builder()
            .child("Corner", &point_descriptor(), |r| &r.corner)
            .build()
            .unwrap()
    }

    fn frame_descriptor() -> Descriptor<Frame> {
        Descriptor::<Frame>::builder()
            .leaf_ref("Label", |f| f.label)
            .optional_child("Corner", &point_descriptor(), |f| f.corner.as_ref())
            .build()
            .unwrap()
    }

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    /// Accepts `budget` writes, then fails every later one.
    struct FailingSink {
        written: String,
        budget: usize,
    }

    impl Sink for FailingSink {
        fn write_str(&mut self, s: &str) -> Result<(), SinkError> {
            if self.budget == 0 {
                return Err(SinkError::Fmt(core::fmt::Error));
            }
            self.budget -= 1;
            self.written.push_str(s);
            Ok(())
        }
    }

    // -----------------------------------------------------------------------------
    // Layout

    #[test]
    fn point_block() {
        let text = point_descriptor()
            .to_markup(&Point { x: 1, y: 2 }, "Point")
            .unwrap();
        assert_eq!(lines(&text), ["<Point>", "<X>1</X>", "<Y>2</Y>", "</Point>"]);
    }

    #[test]
    fn point_block_with_legacy_closing() {
        let text = point_descriptor()
            .to_markup_with(&Point { x: 1, y: 2 }, "Point", &MarkupStyle::LEGACY)
            .unwrap();
        assert_eq!(text, "<Point>\n<X>1</X>\n<Y>2</Y>\n<Point>\n");
    }

    #[test]
    fn nested_block() {
        let value = Rect {
            corner: Point { x: 3, y: 4 },
        };
        let text = rect_descriptor().to_markup(&value, "Box").unwrap();
        assert_eq!(
            lines(&text),
            ["<Box>", "<Corner>", "<X>3</X>", "<Y>4</Y>", "</Corner>", "</Box>"]
        );
    }

    #[test]
    fn fields_follow_registration_not_declaration() {
        struct Triple {
            a: u8,
            b: u8,
            c: u8,
        }

        let descriptor = Descriptor::<Triple>::builder()
            .leaf("C", |t| t.c)
            .leaf("A", |t| t.a)
            .leaf("B", |t| t.b)
            .build()
            .unwrap();

        let text = descriptor.to_markup(&Triple { a: 1, b: 2, c: 3 }, "T").unwrap();
        assert_eq!(lines(&text), ["<T>", "<C>3</C>", "<A>1</A>", "<B>2</B>", "</T>"]);
    }

    #[test]
    fn child_block_sits_where_it_was_registered() {
        struct Labelled {
            before: &'static str,
            point: Point,
            after: &'static str,
        }

        let descriptor = Descriptor::<Labelled>::builder()
            .leaf_ref("Before", |l| l.before)
            .child("Point", &point_descriptor(), |l| &l.point)
            .leaf_ref("After", |l| l.after)
            .build()
            .unwrap();

        let value = Labelled {
            before: "b",
            point: Point { x: 5, y: 6 },
            after: "a",
        };
        let text = descriptor.to_markup(&value, "L").unwrap();
        assert_eq!(
            lines(&text),
            [
                "<L>",
                "<Before>b</Before>",
                "<Point>",
                "<X>5</X>",
                "<Y>6</Y>",
                "</Point>",
                "<After>a</After>",
                "</L>",
            ]
        );
    }

    #[test]
    fn serialization_is_repeatable_and_reusable() {
        let descriptor = point_descriptor();
        let first = descriptor.to_markup(&Point { x: 1, y: 2 }, "P").unwrap();
        let again = descriptor.to_markup(&Point { x: 1, y: 2 }, "P").unwrap();
        assert_eq!(first, again);

        let other = descriptor.to_markup(&Point { x: -7, y: 40 }, "P").unwrap();
        assert_eq!(lines(&other), ["<P>", "<X>-7</X>", "<Y>40</Y>", "</P>"]);
    }

    #[test]
    fn style_options_apply_to_nested_blocks() {
        let style = MarkupStyle::DEFAULT
            .with_indent(2)
            .with_line_ending(LineEnding::CrLf);
        let value = Rect {
            corner: Point { x: 3, y: 4 },
        };
        let text = rect_descriptor().to_markup_with(&value, "Box", &style).unwrap();
        assert_eq!(
            text,
            "<Box>\r\n  <Corner>\r\n    <X>3</X>\r\n    <Y>4</Y>\r\n  </Corner>\r\n</Box>\r\n"
        );
    }

    #[test]
    fn sequence_writes_one_block_per_item() {
        struct Polygon {
            points: Vec<Point>,
        }

        let descriptor = Descriptor::<Polygon>::builder()
            .sequence("Point", &point_descriptor(), |p| p.points.as_slice())
            .build()
            .unwrap();
        assert_eq!(
            descriptor.renderers().next().unwrap().kind(),
            RendererKind::Sequence {
                type_name: core::any::type_name::<Point>()
            }
        );

        let polygon = Polygon {
            points: vec![Point { x: 0, y: 0 }, Point { x: 1, y: 1 }],
        };
        let text = descriptor.to_markup(&polygon, "Polygon").unwrap();
        assert_eq!(text.matches("<Point>").count(), 2);
        assert_eq!(text.matches("</Point>").count(), 2);

        let empty = descriptor.to_markup(&Polygon { points: vec![] }, "Polygon").unwrap();
        assert_eq!(lines(&empty), ["<Polygon>", "</Polygon>"]);
    }

    // -----------------------------------------------------------------------------
    // Absent values

    #[test]
    fn absent_child_fails_by_default() {
        let frame = Frame {
            label: "empty",
            corner: None,
        };
        let mut out = String::new();
        let err = frame_descriptor()
            .serialize(&mut out, &frame, "Frame")
            .unwrap_err();

        assert!(matches!(err.kind(), SerializeErrorKind::MissingValue));
        assert_eq!(err.path().tags().collect::<Vec<_>>(), ["Frame", "Corner"]);
        assert_eq!(out, "<Frame>\n<Label>empty</Label>\n");
    }

    #[cfg(all(debug_assertions, feature = "debug"))]
    #[test]
    fn absent_child_error_names_the_frame_type() {
        let frame = Frame {
            label: "empty",
            corner: None,
        };
        let err = frame_descriptor().to_markup(&frame, "Frame").unwrap_err();
        assert_eq!(
            err.path().to_string(),
            format!("Frame<{}>/Corner", core::any::type_name::<Frame>())
        );
    }

    #[test]
    fn absent_child_can_be_skipped_or_emptied() {
        let descriptor = frame_descriptor();
        let frame = Frame {
            label: "empty",
            corner: None,
        };

        let skip = MarkupStyle::DEFAULT.with_missing(MissingPolicy::Skip);
        let text = descriptor.to_markup_with(&frame, "Frame", &skip).unwrap();
        assert_eq!(lines(&text), ["<Frame>", "<Label>empty</Label>", "</Frame>"]);

        let empty = MarkupStyle::DEFAULT.with_missing(MissingPolicy::Empty);
        let text = descriptor.to_markup_with(&frame, "Frame", &empty).unwrap();
        assert_eq!(
            lines(&text),
            ["<Frame>", "<Label>empty</Label>", "<Corner/>", "</Frame>"]
        );

        let present = Frame {
            label: "full",
            corner: Some(Point { x: 1, y: 1 }),
        };
        let text = descriptor.to_markup_with(&present, "Frame", &skip).unwrap();
        assert!(text.contains("<Corner>\n<X>1</X>\n<Y>1</Y>\n</Corner>\n"));
    }

    #[test]
    fn absent_leaf_follows_the_same_policy() {
        struct Contact {
            nick: Option<String>,
        }

        let descriptor = Descriptor::<Contact>::builder()
            .optional_leaf("Nick", |c| c.nick.as_deref())
            .build()
            .unwrap();

        let named = Contact {
            nick: Some("pj".to_string()),
        };
        assert_eq!(
            descriptor.to_markup(&named, "Contact").unwrap(),
            "<Contact>\n<Nick>pj</Nick>\n</Contact>\n"
        );

        let empty = MarkupStyle::DEFAULT.with_missing(MissingPolicy::Empty);
        let text = descriptor
            .to_markup_with(&Contact { nick: None }, "Contact", &empty)
            .unwrap();
        assert_eq!(text, "<Contact>\n<Nick/>\n</Contact>\n");
    }

    // -----------------------------------------------------------------------------
    // Failures

    #[test]
    fn accessor_failure_aborts_and_keeps_partial_output() {
        struct Reading {
            station: &'static str,
            raw: &'static str,
        }

        let descriptor = Descriptor::<Reading>::builder()
            .leaf_ref("Station", |r| r.station)
            .try_leaf("Value", |r| r.raw.parse::<i32>())
            .leaf("Never", |_| 0)
            .build()
            .unwrap();

        let ok = Reading {
            station: "north",
            raw: "12",
        };
        assert!(descriptor.to_markup(&ok, "Reading").unwrap().contains("<Value>12</Value>"));

        let bad = Reading {
            station: "north",
            raw: "twelve",
        };
        let mut out = String::new();
        let err = descriptor.serialize(&mut out, &bad, "Reading").unwrap_err();

        assert!(matches!(err.kind(), SerializeErrorKind::Accessor(_)));
        assert_eq!(err.path().tags().collect::<Vec<_>>(), ["Reading", "Value"]);
        assert_eq!(out, "<Reading>\n<Station>north</Station>\n");
    }

    #[test]
    fn sink_failure_aborts_immediately() {
        let value = Rect {
            corner: Point { x: 3, y: 4 },
        };
        // The `<Box>` line takes four writes, the fifth starts `<Corner>`.
        let mut sink = FailingSink {
            written: String::new(),
            budget: 5,
        };
        let err = rect_descriptor()
            .serialize(&mut sink, &value, "Box")
            .unwrap_err();

        assert!(matches!(err.kind(), SerializeErrorKind::Sink(SinkError::Fmt(_))));
        assert_eq!(err.path().tags().collect::<Vec<_>>(), ["Box", "Corner"]);
        assert!(sink.written.starts_with("<Box>\n"));
    }

    #[test]
    fn empty_root_tag_is_rejected() {
        let mut out = String::new();
        let err = point_descriptor()
            .serialize(&mut out, &Point { x: 0, y: 0 }, "")
            .unwrap_err();
        assert!(matches!(err.kind(), SerializeErrorKind::EmptyTag));
        assert!(err.path().is_empty());
        assert!(out.is_empty());
    }

    // -----------------------------------------------------------------------------
    // Sharing

    #[test]
    fn descriptors_are_send_and_sync() {
        fn is_send_sync<T: Send + Sync>() {}
        is_send_sync::<Descriptor<Point>>();
        is_send_sync::<Descriptor<Person>>();
    }

    #[cfg(feature = "std")]
    #[test]
    fn one_descriptor_serves_many_threads() {
        let descriptor = point_descriptor();

        let outputs: Vec<String> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let descriptor = &descriptor;
                    scope.spawn(move || descriptor.to_markup(&Point { x: i, y: i * 10 }, "P").unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for (i, text) in outputs.iter().enumerate() {
            assert_eq!(*text, format!("<P>\n<X>{i}</X>\n<Y>{}</Y>\n</P>\n", i * 10));
        }
    }

    // -----------------------------------------------------------------------------
    // Person graph

    struct Address {
        street: String,
        city: String,
    }

    struct Country {
        name: String,
        area_code: u16,
    }

    struct PhoneNumber {
        country: Arc<Country>,
        number: u32,
    }

    struct Person {
        first_name: String,
        last_name: String,
        home_address: Address,
        work_address: Address,
        citizen_of: Arc<Country>,
        mobile_phone: PhoneNumber,
    }

    fn person_descriptor() -> Descriptor<Person> {
        let address = Descriptor::<Address>::builder()
            .leaf_ref("Street", |a| a.street.as_str())
            .leaf_ref("City", |a| a.city.as_str())
            .build()
            .unwrap();

        let country = Descriptor::<Country>::builder()
            .leaf_ref("Name", |c| c.name.as_str())
            .leaf("AreaCode", |c| c.area_code)
            .build()
            .unwrap();

        let phone = Descriptor::<PhoneNumber>::builder()
            .child("Country", &country, |p| &*p.country)
            .leaf("Number", |p| p.number)
            .build()
            .unwrap();

        Descriptor::<Person>::builder()
            .leaf_ref("FirstName", |p| p.first_name.as_str())
            .leaf_ref("LastName", |p| p.last_name.as_str())
            .child("HomeAddress", &address, |p| &p.home_address)
            .child("WorkAddress", &address, |p| &p.work_address)
            .child("CitizenOf", &country, |p| &*p.citizen_of)
            .child("MobilePhone", &phone, |p| &p.mobile_phone)
            .build()
            .unwrap()
    }

    fn sample_person() -> Person {
        let czech_republic = Arc::new(Country {
            name: "Czech Republic".to_string(),
            area_code: 420,
        });

        Person {
            first_name: "Pavel".to_string(),
            last_name: "Jezek".to_string(),
            home_address: Address {
                street: "Patkova".to_string(),
                city: "Prague".to_string(),
            },
            work_address: Address {
                street: "Malostranske namesti".to_string(),
                city: "Prague".to_string(),
            },
            citizen_of: Arc::clone(&czech_republic),
            mobile_phone: PhoneNumber {
                country: czech_republic,
                number: 123456789,
            },
        }
    }

    const PERSON_MARKUP: &str = concat!(
        "<Person>\n",
        "<FirstName>Pavel</FirstName>\n",
        "<LastName>Jezek</LastName>\n",
        "<HomeAddress>\n",
        "<Street>Patkova</Street>\n",
        "<City>Prague</City>\n",
        "</HomeAddress>\n",
        "<WorkAddress>\n",
        "<Street>Malostranske namesti</Street>\n",
        "<City>Prague</City>\n",
        "</WorkAddress>\n",
        "<CitizenOf>\n",
        "<Name>Czech Republic</Name>\n",
        "<AreaCode>420</AreaCode>\n",
        "</CitizenOf>\n",
        "<MobilePhone>\n",
        "<Country>\n",
        "<Name>Czech Republic</Name>\n",
        "<AreaCode>420</AreaCode>\n",
        "</Country>\n",
        "<Number>123456789</Number>\n",
        "</MobilePhone>\n",
        "</Person>\n",
    );

    #[test]
    fn person_graph() {
        let descriptor = person_descriptor();
        assert_eq!(
            descriptor.tags().collect::<Vec<_>>(),
            ["FirstName", "LastName", "HomeAddress", "WorkAddress", "CitizenOf", "MobilePhone"]
        );

        let text = descriptor.to_markup(&sample_person(), "Person").unwrap();
        assert_eq!(text, PERSON_MARKUP);
    }

    #[test]
    fn person_graph_legacy_closing_only_changes_closing_lines() {
        let style = MarkupStyle::DEFAULT.with_closing(ClosingTag::Legacy);
        let legacy = person_descriptor()
            .to_markup_with(&sample_person(), "Person", &style)
            .unwrap();

        assert!(!legacy.contains("\n</"));
        assert_eq!(legacy.replace('\n', "").len() + 6, PERSON_MARKUP.replace('\n', "").len());
        assert!(legacy.ends_with("</Number>\n<MobilePhone>\n<Person>\n"));
    }

    #[cfg(feature = "std")]
    #[test]
    fn person_graph_to_io_writer() {
        let mut sink = crate::IoSink::new(Vec::new());
        person_descriptor()
            .serialize(&mut sink, &sample_person(), "Person")
            .unwrap();
        assert_eq!(sink.into_inner(), PERSON_MARKUP.as_bytes());
    }
}
