pub mod library_xml;
