//! Walks an ODX document and compiles Read-Data-By-Identifier
//! `DIAG-SERVICE` elements into a [`ServiceContainer`].
//!
//! Grounded step-for-step on `ReadDataByIdentifierMethodFactory` and
//! `UtilityFunctions` in the source tool this crate's behavior was
//! distilled from (`examples/original_source/uds/uds_config_tool/`).

use std::collections::{BTreeMap, HashMap};

use roxmltree::Node;

use crate::container::{ServiceContainer, ServiceDescriptor};
use crate::diag_coded_type::{BaseDataType, DiagCodedType, Termination};
use crate::neg_response::NegResponseChecker;
use crate::param::Param;
use crate::pos_response::PosResponse;

use super::document::XmlIndex;
use super::error::{OdxError, OdxResult};

const RDBI_SID: u32 = 0x22;

/// Compiles every SID-0x22 `DIAG-SERVICE` in `xml` into a
/// [`ServiceContainer`].
///
/// An ODX document with no such service compiles to an empty container
/// rather than an error, matching `UdsConfigTool.createUdsConnection`'s
/// `rdbiService_flag` guard (an absent service is simply not registered).
pub fn compile_rdbi(xml: &str) -> OdxResult<ServiceContainer> {
    let index = XmlIndex::parse(xml)?;

    let mut descriptors = HashMap::new();
    for service in index.elements_by_tag("DIAG-SERVICE").collect::<Vec<_>>() {
        let request_sid = service_id(&service, &index)?;
        if request_sid != RDBI_SID {
            continue;
        }

        let name = diag_instance_name(&service)?;
        let did_bytes = request_did_bytes(&service, &index)?;
        let pos_response = compile_pos_response(&service, &index)?;
        let neg_response = compile_neg_response(&service, &index)?;

        reject_ambiguous_end_of_pdu(&name, &pos_response)?;

        descriptors.insert(
            name,
            ServiceDescriptor {
                sid_bytes: vec![RDBI_SID as u8],
                did_bytes,
                pos_response,
                neg_response,
            },
        );
    }

    Ok(ServiceContainer::new(descriptors))
}

/// Multi-DID requests on the same container concatenate DID bodies one
/// after another; a DID whose response body runs to the end of the PDU
/// can only ever be safe as the last element of such a concatenation, and
/// this compiler has no way to know where it will sit in a future
/// concatenated request, so it refuses any `EndOfPdu` DID up front.
fn reject_ambiguous_end_of_pdu(name: &str, pos_response: &PosResponse) -> OdxResult<()> {
    let has_end_of_pdu = pos_response.params.iter().any(|p| {
        matches!(
            p.diag_coded_type,
            DiagCodedType::MinMaxLength {
                termination: Termination::EndOfPdu,
                max_length: None,
                ..
            }
        )
    });
    if has_end_of_pdu {
        return Err(OdxError::AmbiguousEndOfPdu { name: name.to_string() });
    }
    Ok(())
}

fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.is_element() && n.tag_name().name() == tag)
}

fn child_text<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<&'input str> {
    find_child(node, tag).and_then(|n| n.text())
}

fn params_of<'a, 'input>(node: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
    find_child(node, "PARAMS")
        .map(|params| params.children().filter(|n| n.is_element()).collect())
        .unwrap_or_default()
}

fn id_ref(node: Node, tag: &str) -> OdxResult<String> {
    let child = find_child(node, tag).ok_or_else(|| OdxError::MissingElement {
        id_ref: tag.to_string(),
    })?;
    child
        .attribute("ID-REF")
        .map(str::to_string)
        .ok_or_else(|| OdxError::MissingElement { id_ref: format!("{}/@ID-REF", tag) })
}

fn xsi_type<'input>(node: Node<'_, 'input>) -> Option<&'input str> {
    node.attributes().find(|a| a.name() == "type").map(|a| a.value())
}

fn service_id(service: &Node, index: &XmlIndex) -> OdxResult<u32> {
    let request = index.resolve(&id_ref(*service, "REQUEST-REF")?)?;
    for param in params_of(request) {
        if param.attribute("SEMANTIC") == Some("SERVICE-ID") {
            return parse_coded_value(param);
        }
    }
    Err(OdxError::MissingElement {
        id_ref: "REQUEST-REF/PARAMS/PARAM[@SEMANTIC='SERVICE-ID']".to_string(),
    })
}

fn request_did_bytes(service: &Node, index: &XmlIndex) -> OdxResult<Vec<u8>> {
    let request = index.resolve(&id_ref(*service, "REQUEST-REF")?)?;
    for param in params_of(request) {
        if param.attribute("SEMANTIC") == Some("ID") {
            let did = parse_coded_value(param)?;
            return Ok(vec![(did >> 8) as u8, did as u8]);
        }
    }
    Err(OdxError::MissingElement {
        id_ref: "REQUEST-REF/PARAMS/PARAM[@SEMANTIC='ID']".to_string(),
    })
}

fn parse_coded_value(param: Node) -> OdxResult<u32> {
    child_text(param, "CODED-VALUE")
        .ok_or_else(|| OdxError::MissingElement { id_ref: "PARAM/CODED-VALUE".to_string() })?
        .trim()
        .parse()
        .map_err(|_| OdxError::MalformedXml {
            reason: "CODED-VALUE was not an integer".to_string(),
        })
}

/// Resolves `SDGS/SDG/SD[@SI='DiagInstanceName']`, the human-readable name
/// this container registers the service under.
fn diag_instance_name(service: &Node) -> OdxResult<String> {
    let sdgs = find_child(*service, "SDGS").ok_or_else(|| OdxError::MissingElement {
        id_ref: "SDGS".to_string(),
    })?;
    let sdg = find_child(sdgs, "SDG").ok_or_else(|| OdxError::MissingElement {
        id_ref: "SDGS/SDG".to_string(),
    })?;
    for sd in sdg.children().filter(|n| n.is_element() && n.tag_name().name() == "SD") {
        if sd.attribute("SI") == Some("DiagInstanceName") {
            return sd.text().map(str::to_string).ok_or_else(|| OdxError::MissingElement {
                id_ref: "SDGS/SDG/SD[@SI='DiagInstanceName']".to_string(),
            });
        }
    }
    Err(OdxError::MissingElement {
        id_ref: "SDGS/SDG/SD[@SI='DiagInstanceName']".to_string(),
    })
}

fn compile_pos_response(service: &Node, index: &XmlIndex) -> OdxResult<PosResponse> {
    let pos_response_refs = find_child(*service, "POS-RESPONSE-REFS").ok_or_else(|| {
        OdxError::MissingElement { id_ref: "POS-RESPONSE-REFS".to_string() }
    })?;
    let pos_response_ref = find_child(pos_response_refs, "POS-RESPONSE-REF").ok_or_else(|| {
        OdxError::MissingElement { id_ref: "POS-RESPONSE-REFS/POS-RESPONSE-REF".to_string() }
    })?;
    let id_ref = pos_response_ref.attribute("ID-REF").ok_or_else(|| OdxError::MissingElement {
        id_ref: "POS-RESPONSE-REFS/POS-RESPONSE-REF/@ID-REF".to_string(),
    })?;
    let pos_response_element = index.resolve(id_ref)?;

    let mut sid_length = 0usize;
    let mut sid = 0u8;
    let mut did_length = 0usize;
    let mut did = 0u32;
    let mut params = Vec::new();

    for param in params_of(pos_response_element) {
        match param.attribute("SEMANTIC") {
            Some("SERVICE-ID") => {
                sid = parse_coded_value(param)? as u8;
                sid_length = byte_length_of(param)?;
            }
            Some("ID") => {
                did = parse_coded_value(param)?;
                did_length = byte_length_of(param)?;
            }
            Some("DATA") => {
                params.push(compile_data_param(param, index)?);
            }
            _ => {}
        }
    }

    if sid_length == 0 {
        return Err(OdxError::MissingElement {
            id_ref: "POS-RESPONSE/PARAMS/PARAM[@SEMANTIC='SERVICE-ID']".to_string(),
        });
    }
    if did_length == 0 {
        return Err(OdxError::MissingElement {
            id_ref: "POS-RESPONSE/PARAMS/PARAM[@SEMANTIC='ID']".to_string(),
        });
    }
    if params.is_empty() {
        return Err(OdxError::MissingElement {
            id_ref: "POS-RESPONSE/PARAMS/PARAM[@SEMANTIC='DATA']".to_string(),
        });
    }
    params.sort_by_key(|p: &Param| p.byte_position);

    Ok(PosResponse {
        sid_length,
        sid,
        did_length,
        did,
        params,
    })
}

fn byte_length_of(param: Node) -> OdxResult<usize> {
    let dct = find_child(param, "DIAG-CODED-TYPE").ok_or_else(|| OdxError::MissingElement {
        id_ref: "PARAM/DIAG-CODED-TYPE".to_string(),
    })?;
    let bit_length: usize = child_text(dct, "BIT-LENGTH")
        .ok_or_else(|| OdxError::MissingElement { id_ref: "DIAG-CODED-TYPE/BIT-LENGTH".to_string() })?
        .trim()
        .parse()
        .map_err(|_| OdxError::MalformedXml { reason: "BIT-LENGTH was not an integer".to_string() })?;
    Ok(bit_length / 8)
}

fn compile_data_param(param: Node, index: &XmlIndex) -> OdxResult<Param> {
    let short_name = child_text(param, "SHORT-NAME")
        .or_else(|| child_text(param, "LONG-NAME"))
        .ok_or_else(|| OdxError::MissingElement { id_ref: "PARAM/SHORT-NAME".to_string() })?
        .to_string();
    let byte_position: usize = child_text(param, "BYTE-POSITION")
        .unwrap_or("0")
        .trim()
        .parse()
        .map_err(|_| OdxError::MalformedXml { reason: "BYTE-POSITION was not an integer".to_string() })?;

    let dop_ref = id_ref(param, "DOP-REF")?;
    let dop_element = index.resolve(&dop_ref)?;
    let diag_coded_type = match dop_element.tag_name().name() {
        "DATA-OBJECT-PROP" => diag_coded_type_from_dop(dop_element)?,
        "STRUCTURE" => diag_coded_type_from_structure(dop_element, index)?,
        other => {
            return Err(OdxError::UnsupportedConstruct {
                feature: format!("DOP-REF target of tag <{}>", other),
            })
        }
    };

    Ok(Param {
        short_name,
        byte_position,
        diag_coded_type,
    })
}

/// Builds a [`DiagCodedType`] from a `DATA-OBJECT-PROP`'s
/// `DIAG-CODED-TYPE`, dispatching on its `xsi:type`.
fn diag_coded_type_from_dop(dop: Node) -> OdxResult<DiagCodedType> {
    let dct = find_child(dop, "DIAG-CODED-TYPE").ok_or_else(|| OdxError::MissingElement {
        id_ref: "DATA-OBJECT-PROP/DIAG-CODED-TYPE".to_string(),
    })?;
    let base_data_type: BaseDataType = dct
        .attribute("BASE-DATA-TYPE")
        .ok_or_else(|| OdxError::MissingElement {
            id_ref: "DIAG-CODED-TYPE/@BASE-DATA-TYPE".to_string(),
        })?
        .into();

    match xsi_type(dct) {
        Some("STANDARD-LENGTH-TYPE") => {
            let bit_length: usize = child_text(dct, "BIT-LENGTH")
                .ok_or_else(|| OdxError::MissingElement {
                    id_ref: "DIAG-CODED-TYPE/BIT-LENGTH".to_string(),
                })?
                .trim()
                .parse()
                .map_err(|_| OdxError::MalformedXml {
                    reason: "BIT-LENGTH was not an integer".to_string(),
                })?;
            Ok(DiagCodedType::StandardLength {
                base_data_type,
                byte_length: bit_length / 8,
            })
        }
        Some("MIN-MAX-LENGTH-TYPE") => {
            let min_length: usize = child_text(dct, "MIN-LENGTH").unwrap_or("0").trim().parse().unwrap_or(0);
            let max_length: Option<usize> = child_text(dct, "MAX-LENGTH")
                .map(|s| s.trim().parse())
                .transpose()
                .map_err(|_| OdxError::MalformedXml {
                    reason: "MAX-LENGTH was not an integer".to_string(),
                })?;
            let termination = match dct.attribute("TERMINATION") {
                Some("ZERO") => Termination::Zero,
                Some("HEX-FF") => Termination::HexFf,
                Some("END-OF-PDU") => Termination::EndOfPdu,
                other => {
                    return Err(OdxError::UnsupportedConstruct {
                        feature: format!("TERMINATION={:?}", other),
                    })
                }
            };
            Ok(DiagCodedType::MinMaxLength {
                base_data_type,
                min_length,
                max_length,
                termination,
            })
        }
        other => Err(OdxError::UnsupportedConstruct {
            feature: format!("DIAG-CODED-TYPE xsi:type={:?}", other),
        }),
    }
}

/// `STRUCTURE` standing in for a `DATA-OBJECT-PROP`: either a fixed
/// `BYTE-SIZE` (length comes from the structure itself, base type from the
/// first descendant DOP) or a nested `DOP-REF` to recurse into.
fn diag_coded_type_from_structure(structure: Node, index: &XmlIndex) -> OdxResult<DiagCodedType> {
    if let Some(byte_size) = child_text(structure, "BYTE-SIZE") {
        let byte_length: usize = byte_size.trim().parse().map_err(|_| OdxError::MalformedXml {
            reason: "BYTE-SIZE was not an integer".to_string(),
        })?;
        let first_dop = structure
            .descendants()
            .find(|n| n.tag_name().name() == "DATA-OBJECT-PROP")
            .ok_or_else(|| OdxError::MissingElement {
                id_ref: "STRUCTURE//DATA-OBJECT-PROP".to_string(),
            })?;
        let base_data_type: BaseDataType = find_child(first_dop, "DIAG-CODED-TYPE")
            .and_then(|dct| dct.attribute("BASE-DATA-TYPE"))
            .ok_or_else(|| OdxError::MissingElement {
                id_ref: "STRUCTURE//DATA-OBJECT-PROP/DIAG-CODED-TYPE/@BASE-DATA-TYPE".to_string(),
            })?
            .into();
        return Ok(DiagCodedType::StandardLength {
            base_data_type,
            byte_length,
        });
    }

    let nested_ref = structure
        .descendants()
        .find(|n| n.tag_name().name() == "DOP-REF")
        .and_then(|n| n.attribute("ID-REF"))
        .ok_or_else(|| OdxError::MissingElement {
            id_ref: "STRUCTURE//DOP-REF".to_string(),
        })?;
    let nested = index.resolve(nested_ref)?;
    match nested.tag_name().name() {
        "DATA-OBJECT-PROP" => diag_coded_type_from_dop(nested),
        "STRUCTURE" => diag_coded_type_from_structure(nested, index),
        other => Err(OdxError::UnsupportedConstruct {
            feature: format!("nested DOP-REF target of tag <{}>", other),
        }),
    }
}

fn compile_neg_response(service: &Node, index: &XmlIndex) -> OdxResult<NegResponseChecker> {
    let requested_sid = service_id(service, index)? as u8;
    let neg_response_refs = find_child(*service, "NEG-RESPONSE-REFS").ok_or_else(|| {
        OdxError::MissingElement { id_ref: "NEG-RESPONSE-REFS".to_string() }
    })?;

    let mut nrc_labels = BTreeMap::new();
    for neg_ref in neg_response_refs.children().filter(|n| n.is_element()) {
        let id_ref = neg_ref.attribute("ID-REF").ok_or_else(|| OdxError::MissingElement {
            id_ref: "NEG-RESPONSE-REFS/NEG-RESPONSE-REF/@ID-REF".to_string(),
        })?;
        let neg_response_element = index.resolve(id_ref)?;
        for param in params_of(neg_response_element) {
            if param.attribute("SEMANTIC") == Some("DATA") {
                if let Ok(dop_ref) = id_ref_of(param, "DOP-REF") {
                    if let Ok(dop) = index.resolve(&dop_ref) {
                        collect_nrc_labels(dop, &mut nrc_labels);
                    }
                }
            }
        }
    }

    Ok(NegResponseChecker {
        sid_length: 1,
        requested_sid,
        nrc_labels,
    })
}

fn id_ref_of(node: Node, tag: &str) -> OdxResult<String> {
    id_ref(node, tag)
}

fn collect_nrc_labels(dop: Node, out: &mut BTreeMap<u8, String>) {
    let Some(compu_method) = find_child(dop, "COMPU-METHOD") else { return };
    let Some(internal_to_phys) = find_child(compu_method, "COMPU-INTERNAL-TO-PHYS") else { return };
    let Some(scales) = find_child(internal_to_phys, "COMPU-SCALES") else { return };
    for scale in scales.children().filter(|n| n.is_element() && n.tag_name().name() == "COMPU-SCALE") {
        let Some(lower_limit) = child_text(scale, "LOWER-LIMIT").and_then(|s| s.trim().parse::<u8>().ok()) else {
            continue;
        };
        let label = find_child(scale, "COMPU-CONST").and_then(|c| child_text(c, "VT"));
        if let Some(label) = label {
            out.insert(lower_limit, label.to_string());
        }
    }
}
