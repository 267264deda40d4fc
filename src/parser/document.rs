//! Document loading: object resolution, page-tree traversal, and assembly
//! of the content model.
//!
//! [`PdfDocument`] owns the file bytes and resolves indirect objects on
//! demand through the cross-reference table, memoizing results. Broken
//! references resolve to [`Object::Null`] and the conversion continues;
//! only damage to the document skeleton (missing catalog, unreadable page
//! tree) aborts with a malformed-structure error.
//!
//! For encrypted files every string and stream payload is decrypted as
//! its object is parsed, before any filter decoding runs.

use crate::cancel::CancelToken;
use crate::detect;
use crate::error::{Error, Result};
use crate::model::{self, ImagePlacement, Metadata, Resource};
use crate::parser::content::{self, FontInfo};
use crate::parser::crypto::{create_security_handler, SecurityHandler};
use crate::parser::filters::{apply_filters, FilterChain};
use crate::parser::lexer::{Lexer, ObjectParser, Token};
use crate::parser::object::{Dict, Object, Stream};
use crate::parser::options::ParseOptions;
use crate::parser::xref::{XrefEntry, XrefTable};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Parse a complete document into the content model.
///
/// This runs detection, cross-reference resolution, decryption and the
/// content interpreter for every selected page. Layout analysis is a
/// separate pass over the returned model.
pub fn parse_document(data: &[u8], options: &ParseOptions) -> Result<model::Document> {
    let format = detect::detect_format_from_bytes(data)?;
    let body = data[format.header_offset..].to_vec();
    let pdf = PdfDocument::open(body, &options.password)?;

    let page_dicts = pdf.collect_page_dicts(&options.cancel)?;
    let total = page_dicts.len() as u32;
    options.pages.validate(total)?;

    let mut document = model::Document::new();
    document.metadata = pdf.metadata(&format.version, total);

    let mut image_ids: HashMap<u32, String> = HashMap::new();
    let mut image_seq = 0usize;
    for (index, (dict, inherited)) in page_dicts.iter().enumerate() {
        options.cancel.check()?;
        let number = index as u32 + 1;
        if !options.pages.contains(number) {
            continue;
        }
        let page = pdf.build_page(
            number,
            dict,
            inherited,
            options,
            &mut document,
            &mut image_ids,
            &mut image_seq,
        )?;
        document.add_page(page);
    }
    Ok(document)
}

/// Attributes a page inherits from its ancestors in the page tree.
#[derive(Debug, Clone, Default)]
struct Inherited {
    resources: Option<Dict>,
    media_box: Option<[f32; 4]>,
    rotate: u16,
}

struct ObjStmData {
    /// (object number, relative offset) pairs from the stream header
    offsets: Vec<(u32, usize)>,
    first: usize,
    data: Vec<u8>,
}

/// A loaded PDF file with lazy, memoized object resolution.
pub struct PdfDocument {
    data: Vec<u8>,
    xref: XrefTable,
    security: Option<Box<dyn SecurityHandler>>,
    encrypt_number: Option<u32>,
    cache: RefCell<HashMap<u32, Object>>,
    in_flight: RefCell<HashSet<u32>>,
    object_streams: RefCell<HashMap<u32, Rc<ObjStmData>>>,
}

impl PdfDocument {
    /// Open a document body (header junk already sliced off) and
    /// authenticate against its encryption dictionary if present.
    pub fn open(data: Vec<u8>, password: &str) -> Result<Self> {
        let mut xref = XrefTable::parse(&data)?;

        // A chain can parse yet point /Root at a slot the table never
        // filled; rebuilding from a raw scan handles that damage too.
        if let Some(root) = xref.trailer.get("Root").and_then(Object::as_reference) {
            if !matches!(
                xref.get(root.number),
                Some(XrefEntry::Offset { .. }) | Some(XrefEntry::InStream { .. })
            ) {
                log::warn!("/Root points at a missing object; rebuilding cross-reference table");
                xref = XrefTable::rebuild(&data)?;
            }
        }

        let mut doc = Self {
            data,
            xref,
            security: None,
            encrypt_number: None,
            cache: RefCell::new(HashMap::new()),
            in_flight: RefCell::new(HashSet::new()),
            object_streams: RefCell::new(HashMap::new()),
        };

        if let Some(encrypt) = doc.xref.trailer.get("Encrypt").cloned() {
            doc.encrypt_number = encrypt.as_reference().map(|r| r.number);
            let encrypt_dict = match doc.resolve(&encrypt) {
                Object::Dict(d) => d,
                other => {
                    return Err(Error::Malformed(format!(
                        "encryption dictionary is {}, expected dictionary",
                        other.type_name()
                    )))
                }
            };
            let doc_id = doc
                .xref
                .trailer
                .get("ID")
                .map(|id| doc.resolve(id))
                .as_ref()
                .and_then(Object::as_array)
                .and_then(|ids| ids.first())
                .and_then(Object::as_string_bytes)
                .map(<[u8]>::to_vec)
                .unwrap_or_default();
            let handler = create_security_handler(&encrypt_dict, &doc_id, password)?;
            doc.security = Some(handler);
        }
        Ok(doc)
    }

    // ==================== Object resolution ====================

    /// Fetch an indirect object by number.
    ///
    /// Failures resolve to `Null`: missing table entries, parse errors at
    /// the recorded offset, and circular lookups all log and continue.
    pub fn get_object(&self, number: u32) -> Object {
        if let Some(cached) = self.cache.borrow().get(&number) {
            return cached.clone();
        }
        if !self.in_flight.borrow_mut().insert(number) {
            log::debug!("object {number} resolves through itself; treating as null");
            return Object::Null;
        }
        let object = self.load_object(number).unwrap_or_else(|err| {
            log::debug!("object {number} unresolvable: {err}");
            Object::Null
        });
        self.in_flight.borrow_mut().remove(&number);
        self.cache.borrow_mut().insert(number, object.clone());
        object
    }

    /// Follow reference chains until a direct object appears.
    pub fn resolve(&self, object: &Object) -> Object {
        let mut current = object.clone();
        let mut hops = 0;
        while let Object::Reference(r) = current {
            if hops > 32 {
                log::debug!("reference chain too deep at object {}", r.number);
                return Object::Null;
            }
            current = self.get_object(r.number);
            hops += 1;
        }
        current
    }

    fn load_object(&self, number: u32) -> Result<Object> {
        match self.xref.get(number) {
            Some(XrefEntry::Offset { offset, .. }) => self.parse_object_at(*offset, number),
            Some(XrefEntry::InStream { container, index }) => {
                self.parse_object_in_stream(*container, *index, number)
            }
            Some(XrefEntry::Free) | None => Err(Error::Malformed(format!(
                "object {number} has no cross-reference entry"
            ))),
        }
    }

    fn parse_object_at(&self, offset: usize, expected: u32) -> Result<Object> {
        if offset >= self.data.len() {
            return Err(Error::Malformed(format!(
                "object {expected} offset {offset} beyond end of file"
            )));
        }
        let mut parser = ObjectParser::at(&self.data, offset);
        let (number, generation) = parser.expect_object_header()?;
        if number != expected {
            return Err(Error::Malformed(format!(
                "offset {offset} holds object {number}, expected {expected}"
            )));
        }

        let object = parser.parse_object()?;
        let object = if let Object::Dict(dict) = object {
            match parser.next_token()? {
                Some(Token::Keyword(ref k)) if k == "stream" => {
                    parser.skip_stream_eol();
                    let data = self.read_stream_data(parser.pos(), &dict)?;
                    Object::Stream(Box::new(Stream { dict, data }))
                }
                _ => Object::Dict(dict),
            }
        } else {
            object
        };
        Ok(self.decrypt_object(number, generation, object))
    }

    /// Slice stream payload bytes, trusting `/Length` only when
    /// `endstream` actually follows it.
    fn read_stream_data(&self, start: usize, dict: &Dict) -> Result<Vec<u8>> {
        let declared = dict
            .get("Length")
            .map(|v| self.resolve(v))
            .as_ref()
            .and_then(Object::as_i64)
            .filter(|&n| n >= 0)
            .map(|n| n as usize);

        if let Some(len) = declared {
            let end = start + len;
            if end <= self.data.len() && endstream_follows(&self.data, end) {
                return Ok(self.data[start..end].to_vec());
            }
            log::warn!("stream /Length {len} does not land on endstream; scanning instead");
        }

        let marker = b"endstream";
        let found = self.data[start..]
            .windows(marker.len())
            .position(|w| w == marker)
            .map(|p| start + p)
            .ok_or_else(|| Error::Malformed("unterminated stream".into()))?;
        let mut end = found;
        if end > start && self.data[end - 1] == b'\n' {
            end -= 1;
        }
        if end > start && self.data[end - 1] == b'\r' {
            end -= 1;
        }
        Ok(self.data[start..end].to_vec())
    }

    fn parse_object_in_stream(&self, container: u32, index: u32, expected: u32) -> Result<Object> {
        let stm = self.load_object_stream(container)?;
        let &(number, offset) = stm.offsets.get(index as usize).ok_or_else(|| {
            Error::Malformed(format!(
                "object stream {container} has no slot {index}"
            ))
        })?;
        if number != expected {
            return Err(Error::Malformed(format!(
                "object stream {container} slot {index} holds object {number}, expected {expected}"
            )));
        }
        let mut parser = ObjectParser::at(&stm.data, stm.first + offset);
        // Compressed objects were decrypted with their container; their
        // strings are already plaintext.
        parser.parse_object()
    }

    fn load_object_stream(&self, container: u32) -> Result<Rc<ObjStmData>> {
        if let Some(cached) = self.object_streams.borrow().get(&container) {
            return Ok(cached.clone());
        }
        let object = self.get_object(container);
        let stream = object.as_stream().ok_or_else(|| {
            Error::Malformed(format!("object stream {container} is missing"))
        })?;
        if stream.dict.get("Type").and_then(Object::as_name) != Some("ObjStm") {
            return Err(Error::Malformed(format!(
                "object {container} is not an object stream"
            )));
        }
        let count = self.dict_i64(&stream.dict, "N").unwrap_or(0).max(0) as usize;
        let first = self.dict_i64(&stream.dict, "First").unwrap_or(0).max(0) as usize;
        let data = self.decode_stream(stream)?;

        let mut offsets = Vec::with_capacity(count);
        let mut lexer = Lexer::new(&data);
        for _ in 0..count {
            let number = match lexer.next_token()? {
                Some(Token::Integer(n)) if n >= 0 => n as u32,
                other => {
                    return Err(Error::Malformed(format!(
                        "bad object number in object stream header: {other:?}"
                    )))
                }
            };
            let offset = match lexer.next_token()? {
                Some(Token::Integer(n)) if n >= 0 => n as usize,
                other => {
                    return Err(Error::Malformed(format!(
                        "bad offset in object stream header: {other:?}"
                    )))
                }
            };
            offsets.push((number, offset));
        }

        let parsed = Rc::new(ObjStmData {
            offsets,
            first,
            data,
        });
        self.object_streams
            .borrow_mut()
            .insert(container, parsed.clone());
        Ok(parsed)
    }

    // ==================== Decryption and filters ====================

    fn decrypt_object(&self, number: u32, generation: u16, object: Object) -> Object {
        let Some(handler) = &self.security else {
            return object;
        };
        if Some(number) == self.encrypt_number {
            return object;
        }
        // Cross-reference streams stay raw regardless of encryption.
        if let Object::Stream(s) = &object {
            if s.dict.get("Type").and_then(Object::as_name) == Some("XRef") {
                return object;
            }
        }
        decrypt_walk(handler.as_ref(), number, generation, object)
    }

    /// Decode a stream's filter chain, resolving indirect filter names
    /// and parameter dictionaries first.
    pub fn decode_stream(&self, stream: &Stream) -> Result<Vec<u8>> {
        let chain = self.resolved_filter_chain(&stream.dict)?;
        apply_filters(&chain, stream.data.clone())
    }

    fn resolved_filter_chain(&self, dict: &Dict) -> Result<FilterChain> {
        let mut chain = FilterChain::new();
        let filter = dict.get("Filter").map(|f| self.resolve(f));
        let parms = dict
            .get("DecodeParms")
            .or_else(|| dict.get("DP"))
            .map(|p| self.resolve(p));

        match filter {
            None | Some(Object::Null) => {}
            Some(Object::Name(name)) => {
                let parms = match parms {
                    Some(Object::Dict(d)) => Some(d),
                    _ => None,
                };
                chain.push((name, parms));
            }
            Some(Object::Array(names)) => {
                let parm_list: Vec<Option<Dict>> = match parms {
                    Some(Object::Array(items)) => items
                        .iter()
                        .map(|p| match self.resolve(p) {
                            Object::Dict(d) => Some(d),
                            _ => None,
                        })
                        .collect(),
                    Some(Object::Dict(d)) => vec![Some(d)],
                    _ => Vec::new(),
                };
                for (i, item) in names.iter().enumerate() {
                    match self.resolve(item) {
                        Object::Name(name) => {
                            chain.push((name, parm_list.get(i).cloned().flatten()))
                        }
                        other => {
                            return Err(Error::Malformed(format!(
                                "filter entry is {}, expected name",
                                other.type_name()
                            )))
                        }
                    }
                }
            }
            Some(other) => {
                return Err(Error::Malformed(format!(
                    "/Filter is {}, expected name or array",
                    other.type_name()
                )))
            }
        }
        Ok(chain)
    }

    // ==================== Page tree ====================

    fn catalog(&self) -> Result<Dict> {
        let root = self
            .xref
            .trailer
            .get("Root")
            .cloned()
            .ok_or_else(|| Error::Malformed("trailer has no /Root entry".into()))?;
        match self.resolve(&root) {
            Object::Dict(d) => Ok(d),
            other => Err(Error::Malformed(format!(
                "document catalog is {}, expected dictionary",
                other.type_name()
            ))),
        }
    }

    fn collect_page_dicts(&self, cancel: &CancelToken) -> Result<Vec<(Dict, Inherited)>> {
        let catalog = self.catalog()?;
        let pages = catalog
            .get("Pages")
            .cloned()
            .ok_or_else(|| Error::Malformed("document catalog has no /Pages entry".into()))?;
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        self.walk_pages(&pages, Inherited::default(), &mut out, &mut visited, 0, cancel)?;
        if out.is_empty() {
            return Err(Error::Malformed("page tree contains no pages".into()));
        }
        Ok(out)
    }

    fn walk_pages(
        &self,
        node: &Object,
        inherited: Inherited,
        out: &mut Vec<(Dict, Inherited)>,
        visited: &mut HashSet<u32>,
        depth: usize,
        cancel: &CancelToken,
    ) -> Result<()> {
        cancel.check()?;
        if depth > 64 {
            log::warn!("page tree deeper than 64 levels; pruning");
            return Ok(());
        }
        if let Object::Reference(r) = node {
            if !visited.insert(r.number) {
                log::debug!("page tree cycles through object {}; pruning", r.number);
                return Ok(());
            }
        }
        let dict = match self.resolve(node) {
            Object::Dict(d) => d,
            other => {
                log::debug!("page tree node is {}, skipping", other.type_name());
                return Ok(());
            }
        };
        let inherited = self.inherit(&dict, inherited);

        let node_type = dict.get("Type").and_then(Object::as_name);
        let is_branch = match node_type {
            Some("Pages") => true,
            Some("Page") => false,
            _ => dict.contains_key("Kids"),
        };
        if is_branch {
            let kids = match self.resolve(dict.get("Kids").unwrap_or(&Object::Null)) {
                Object::Array(kids) => kids,
                other => {
                    log::debug!("/Kids is {}, skipping subtree", other.type_name());
                    return Ok(());
                }
            };
            for kid in &kids {
                self.walk_pages(kid, inherited.clone(), out, visited, depth + 1, cancel)?;
            }
        } else {
            out.push((dict, inherited));
        }
        Ok(())
    }

    fn inherit(&self, dict: &Dict, mut inherited: Inherited) -> Inherited {
        if let Some(res) = dict.get("Resources") {
            if let Object::Dict(d) = self.resolve(res) {
                inherited.resources = Some(d);
            }
        }
        if let Some(media_box) = dict.get("MediaBox") {
            if let Some(rect) = self.parse_rect(media_box) {
                inherited.media_box = Some(rect);
            }
        }
        if let Some(rotate) = dict.get("Rotate") {
            if let Some(deg) = self.resolve(rotate).as_i64() {
                inherited.rotate = (deg.rem_euclid(360) as u16 / 90) * 90;
            }
        }
        inherited
    }

    fn parse_rect(&self, value: &Object) -> Option<[f32; 4]> {
        let array = match self.resolve(value) {
            Object::Array(a) => a,
            _ => return None,
        };
        if array.len() != 4 {
            return None;
        }
        let mut rect = [0f32; 4];
        for (slot, item) in rect.iter_mut().zip(&array) {
            *slot = self.resolve(item).as_f64()? as f32;
        }
        Some(rect)
    }

    // ==================== Page assembly ====================

    #[allow(clippy::too_many_arguments)]
    fn build_page(
        &self,
        number: u32,
        dict: &Dict,
        inherited: &Inherited,
        options: &ParseOptions,
        document: &mut model::Document,
        image_ids: &mut HashMap<u32, String>,
        image_seq: &mut usize,
    ) -> Result<model::Page> {
        let media = inherited.media_box.unwrap_or([0.0, 0.0, 612.0, 792.0]);
        let width = (media[2] - media[0]).abs();
        let height = (media[3] - media[1]).abs();
        let mut page = model::Page::new(number, width, height);
        page.rotation = inherited.rotate;

        let resources = inherited.resources.clone().unwrap_or_default();
        let fonts = self.font_map(&resources);
        let content = self.content_bytes(dict.get("Contents"))?;
        let interpreted = content::interpret(&content, &fonts);
        page.spans = interpreted.spans;

        if options.extract_images && !interpreted.images.is_empty() {
            let xobjects = match self.resolve(resources.get("XObject").unwrap_or(&Object::Null)) {
                Object::Dict(d) => d,
                _ => Dict::new(),
            };
            for draw in &interpreted.images {
                let Some(value) = xobjects.get(&draw.name) else {
                    log::debug!("XObject /{} not found in page resources", draw.name);
                    continue;
                };
                if let Some(id) = self.image_resource_id(value, document, image_ids, image_seq) {
                    page.images.push(ImagePlacement {
                        resource_id: id,
                        x: draw.x,
                        y: draw.y,
                        width: draw.width,
                        height: draw.height,
                    });
                }
            }
        }
        Ok(page)
    }

    /// Concatenated, decoded bytes of the page's content streams.
    fn content_bytes(&self, contents: Option<&Object>) -> Result<Vec<u8>> {
        let Some(contents) = contents else {
            return Ok(Vec::new());
        };
        match self.resolve(contents) {
            Object::Stream(stream) => self.decode_stream(&stream),
            Object::Array(parts) => {
                let mut out = Vec::new();
                for part in &parts {
                    match self.resolve(part) {
                        Object::Stream(stream) => {
                            if !out.is_empty() {
                                out.push(b'\n');
                            }
                            out.extend(self.decode_stream(&stream)?);
                        }
                        other => {
                            log::debug!(
                                "content stream entry is {}, skipping",
                                other.type_name()
                            );
                        }
                    }
                }
                Ok(out)
            }
            other => {
                log::debug!("/Contents is {}, treating page as empty", other.type_name());
                Ok(Vec::new())
            }
        }
    }

    fn font_map(&self, resources: &Dict) -> HashMap<String, FontInfo> {
        let mut map = HashMap::new();
        let fonts = match self.resolve(resources.get("Font").unwrap_or(&Object::Null)) {
            Object::Dict(d) => d,
            _ => return map,
        };
        for (name, value) in &fonts {
            let dict = match self.resolve(value) {
                Object::Dict(d) => d,
                other => {
                    log::debug!("font /{name} is {}, leaving unresolved", other.type_name());
                    continue;
                }
            };
            let base = dict
                .get("BaseFont")
                .and_then(Object::as_name)
                .map(strip_subset_prefix)
                .unwrap_or(name.as_str());
            map.insert(name.clone(), FontInfo::new(name, base));
        }
        map
    }

    // ==================== Images ====================

    fn image_resource_id(
        &self,
        value: &Object,
        document: &mut model::Document,
        image_ids: &mut HashMap<u32, String>,
        image_seq: &mut usize,
    ) -> Option<String> {
        let object_number = value.as_reference().map(|r| r.number);
        if let Some(num) = object_number {
            if let Some(id) = image_ids.get(&num) {
                return Some(id.clone());
            }
        }
        let resolved = self.resolve(value);
        let stream = resolved.as_stream()?;
        if stream.dict.get("Subtype").and_then(Object::as_name) != Some("Image") {
            return None;
        }
        let resource = self.extract_image(stream)?;

        *image_seq += 1;
        let id = format!("img-{image_seq}");
        document.add_resource(id.clone(), resource);
        if let Some(num) = object_number {
            image_ids.insert(num, id.clone());
        }
        Some(id)
    }

    /// Pull image bytes out of a stream, keeping natively-compressed
    /// formats (JPEG, JPEG 2000) as-is and decoding everything else.
    fn extract_image(&self, stream: &Stream) -> Option<Resource> {
        let chain = match self.resolved_filter_chain(&stream.dict) {
            Ok(chain) => chain,
            Err(err) => {
                log::debug!("image filter chain unreadable: {err}");
                return None;
            }
        };

        let mut prefix = FilterChain::new();
        let mut container: Option<&'static str> = None;
        for (name, parms) in chain {
            match name.as_str() {
                "DCTDecode" | "DCT" => {
                    container = Some("image/jpeg");
                    break;
                }
                "JPXDecode" => {
                    container = Some("image/jp2");
                    break;
                }
                "CCITTFaxDecode" | "CCF" | "JBIG2Decode" => {
                    log::debug!("skipping image with unsupported codec {name}");
                    return None;
                }
                _ => prefix.push((name, parms)),
            }
        }

        let data = match apply_filters(&prefix, stream.data.clone()) {
            Ok(data) => data,
            Err(err) => {
                log::debug!("skipping image: {err}");
                return None;
            }
        };
        let mime = container
            .or_else(|| Resource::detect_mime_type(&data))
            .unwrap_or("application/octet-stream");
        let mut resource = Resource::new(data, mime);

        let width = self.dict_i64(&stream.dict, "Width");
        let height = self.dict_i64(&stream.dict, "Height");
        if let (Some(w), Some(h)) = (width, height) {
            if w > 0 && h > 0 {
                resource = resource.with_dimensions(w as u32, h as u32);
            }
        }
        if let Some(bits) = self.dict_i64(&stream.dict, "BitsPerComponent") {
            resource = resource.with_bits_per_component(bits.clamp(1, 64) as u8);
        }
        if let Some(cs) = self.color_space_name(&stream.dict) {
            resource = resource.with_color_space(cs);
        }
        Some(resource)
    }

    fn color_space_name(&self, dict: &Dict) -> Option<String> {
        match self.resolve(dict.get("ColorSpace")?) {
            Object::Name(name) => Some(name),
            Object::Array(items) => items
                .first()
                .and_then(Object::as_name)
                .map(str::to_string),
            _ => None,
        }
    }

    // ==================== Metadata ====================

    fn metadata(&self, version: &str, total_pages: u32) -> Metadata {
        let mut meta = Metadata::with_version(version);
        meta.page_count = total_pages;
        meta.encrypted = self.security.is_some();

        let info = match self
            .xref
            .trailer
            .get("Info")
            .map(|i| self.resolve(i))
        {
            Some(Object::Dict(d)) => d,
            _ => return meta,
        };
        meta.title = self.text_field(&info, "Title");
        meta.author = self.text_field(&info, "Author");
        meta.subject = self.text_field(&info, "Subject");
        meta.keywords = self.text_field(&info, "Keywords");
        meta.creator = self.text_field(&info, "Creator");
        meta.producer = self.text_field(&info, "Producer");
        meta.created = self.date_field(&info, "CreationDate");
        meta.modified = self.date_field(&info, "ModDate");
        meta
    }

    fn text_field(&self, dict: &Dict, key: &str) -> Option<String> {
        let value = self.resolve(dict.get(key)?);
        let bytes = value.as_string_bytes()?;
        let text = content::decode_string(bytes);
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    fn date_field(&self, dict: &Dict, key: &str) -> Option<DateTime<Utc>> {
        self.text_field(dict, key)
            .as_deref()
            .and_then(parse_pdf_date)
    }

    fn dict_i64(&self, dict: &Dict, key: &str) -> Option<i64> {
        dict.get(key).map(|v| self.resolve(v)).as_ref().and_then(Object::as_i64)
    }
}

fn decrypt_walk(
    handler: &dyn SecurityHandler,
    number: u32,
    generation: u16,
    object: Object,
) -> Object {
    match object {
        Object::String(bytes) => {
            Object::String(handler.decrypt_string(number, generation, &bytes))
        }
        Object::Array(items) => Object::Array(
            items
                .into_iter()
                .map(|item| decrypt_walk(handler, number, generation, item))
                .collect(),
        ),
        Object::Dict(dict) => Object::Dict(
            dict.into_iter()
                .map(|(k, v)| (k, decrypt_walk(handler, number, generation, v)))
                .collect(),
        ),
        Object::Stream(stream) => {
            let data = handler.decrypt_stream(number, generation, &stream.data);
            let dict = stream
                .dict
                .into_iter()
                .map(|(k, v)| (k, decrypt_walk(handler, number, generation, v)))
                .collect();
            Object::Stream(Box::new(Stream { dict, data }))
        }
        other => other,
    }
}

fn endstream_follows(data: &[u8], mut pos: usize) -> bool {
    while pos < data.len() && crate::parser::lexer::is_whitespace(data[pos]) {
        pos += 1;
    }
    data[pos..].starts_with(b"endstream")
}

/// `ABCDEF+Name` subset prefixes hide the real base name.
fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((prefix, rest))
            if prefix.len() == 6 && prefix.bytes().all(|b| b.is_ascii_uppercase()) =>
        {
            rest
        }
        _ => name,
    }
}

/// Parse a `D:YYYYMMDDHHmmSS` date with optional timezone suffix.
fn parse_pdf_date(value: &str) -> Option<DateTime<Utc>> {
    let s = value.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);

    let digits = |range: std::ops::Range<usize>, default: u32| -> Option<u32> {
        match s.get(range) {
            Some(part) if part.chars().all(|c| c.is_ascii_digit()) => part.parse().ok(),
            Some(_) => None,
            None => Some(default),
        }
    };

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month = digits(4..6, 1)?;
    let day = digits(6..8, 1)?;
    let hour = digits(8..10, 0)?;
    let minute = digits(10..12, 0)?;
    let second = digits(12..14, 0)?;

    let offset_seconds = match s.get(14..15) {
        Some("Z") | None => 0,
        Some(sign @ ("+" | "-")) => {
            let hh: i32 = s.get(15..17).and_then(|p| p.parse().ok()).unwrap_or(0);
            let mm: i32 = s.get(18..20).and_then(|p| p.parse().ok()).unwrap_or(0);
            let total = hh * 3600 + mm * 60;
            if sign == "-" {
                -total
            } else {
                total
            }
        }
        Some(_) => 0,
    };

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    let offset = FixedOffset::east_opt(offset_seconds)?;
    let local = offset.from_local_datetime(&naive).single()?;
    Some(local.with_timezone(&Utc))
}
